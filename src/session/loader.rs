use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::data::RowSource;
use crate::session::snapshot::{load_snapshot, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Preloading timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Loader task failed: {0}")]
    WorkerFailed(String),
}

struct LoadMessage {
    ticket: u64,
    result: Result<Snapshot, String>,
}

/// Owns the current snapshot and runs loads on background tasks.
///
/// Every load gets a ticket. Only the result carrying the current ticket is
/// installed; a timeout advances the ticket so a late result is dropped.
pub struct Session {
    source: Arc<dyn RowSource>,
    current: Arc<Snapshot>,
    ticket: u64,
    tx: mpsc::UnboundedSender<LoadMessage>,
    rx: mpsc::UnboundedReceiver<LoadMessage>,
}

impl Session {
    pub fn new(source: Arc<dyn RowSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            current: Arc::new(Snapshot::empty()),
            ticket: 0,
            tx,
            rx,
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// Initial load. Gives up after `timeout`; the background fetch is left to
    /// finish on its own and its result is ignored.
    pub async fn preload(&mut self, timeout: Duration) -> Result<Arc<Snapshot>, LoadError> {
        let ticket = self.start_load();
        let outcome = tokio::time::timeout(timeout, self.wait_for(ticket)).await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                self.ticket += 1;
                warn!("Preload {} timed out after {:?}", ticket, timeout);
                Err(LoadError::TimedOut(timeout))
            }
        }
    }

    /// Forced reload with no timeout.
    pub async fn refresh(&mut self) -> Result<Arc<Snapshot>, LoadError> {
        let ticket = self.start_load();
        self.wait_for(ticket).await
    }

    fn start_load(&mut self) -> u64 {
        self.ticket += 1;
        let ticket = self.ticket;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            // Inner task so a panic while loading comes back as a JoinError
            let result = tokio::spawn(async move { load_snapshot(source.as_ref()).await })
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(LoadMessage { ticket, result });
        });

        debug!("Started load {}", ticket);
        ticket
    }

    async fn wait_for(&mut self, ticket: u64) -> Result<Arc<Snapshot>, LoadError> {
        loop {
            // `self.tx` keeps the channel open, so `None` cannot happen here
            let Some(message) = self.rx.recv().await else {
                return Err(LoadError::WorkerFailed("result channel closed".to_string()));
            };
            if message.ticket != ticket {
                debug!("Ignoring stale result of load {} (waiting for {})", message.ticket, ticket);
                continue;
            }
            let snapshot = message.result.map_err(LoadError::WorkerFailed)?;
            return Ok(self.install(snapshot));
        }
    }

    fn install(&mut self, snapshot: Snapshot) -> Arc<Snapshot> {
        info!(
            "Installed snapshot: {} bets across {} sports",
            snapshot.records.len(),
            snapshot.sports.len()
        );
        self.current = Arc::new(snapshot);
        Arc::clone(&self.current)
    }
}
