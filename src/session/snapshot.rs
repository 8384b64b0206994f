use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{error, info};

use crate::data::ingest::parse_rows;
use crate::data::types::BetRecord;
use crate::data::RowSource;
use crate::stats::odds_table::{build_sport_caches, sorted_sports, SportCache};
use crate::stats::tournament_stats::{build_tournament_tree, TournamentTree};

/// Where a snapshot's records came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOrigin {
    Fetched,
    /// The fetch failed; the snapshot is empty but this is not "zero bets".
    FetchFailed(String),
}

/// Everything derived from one load of the sheet. Never mutated; a refresh
/// produces a new one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<BetRecord>,
    pub sports: HashMap<String, SportCache>,
    pub sport_order: Vec<String>,
    pub tournaments: TournamentTree,
    pub origin: DataOrigin,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn build(records: Vec<BetRecord>, origin: DataOrigin) -> Self {
        let sports = build_sport_caches(&records);
        let sport_order = sorted_sports(&sports);
        let tournaments = build_tournament_tree(&records);

        Self {
            records,
            sports,
            sport_order,
            tournaments,
            origin,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::build(Vec::new(), DataOrigin::Fetched)
    }

    pub fn sport(&self, name: &str) -> Option<&SportCache> {
        self.sports.get(name)
    }

    /// Sport with the most bets, if any.
    pub fn top_sport(&self) -> Option<&str> {
        self.sport_order.first().map(String::as_str)
    }

    pub fn fetch_error(&self) -> Option<&str> {
        match &self.origin {
            DataOrigin::Fetched => None,
            DataOrigin::FetchFailed(reason) => Some(reason),
        }
    }
}

/// Fetch, validate and aggregate. Fetch errors are logged and produce an
/// empty snapshot tagged `FetchFailed`.
pub async fn load_snapshot(source: &dyn RowSource) -> Snapshot {
    match source.fetch_rows().await {
        Ok(rows) => {
            let records = parse_rows(&rows);
            info!("Loaded {} bets from {} rows", records.len(), rows.len());
            Snapshot::build(records, DataOrigin::Fetched)
        }
        Err(e) => {
            error!("Error fetching bet data: {}", e);
            Snapshot::build(Vec::new(), DataOrigin::FetchFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sheets::SheetsError;
    use async_trait::async_trait;

    struct FixedRows(Vec<Vec<String>>);

    #[async_trait]
    impl RowSource for FixedRows {
        async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SheetsError> {
            Ok(self.0.clone())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl RowSource for Unreachable {
        async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SheetsError> {
            Err(SheetsError::Status { status: 503, body: "backend unavailable".to_string() })
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_builds_all_views() {
        let source = FixedRows(vec![
            row(&["CS2", "ESL Pro League", "A vs B", "ML", "Not Live", "1,85", "", "Win"]),
            row(&["CS2", "ESL Pro League", "A vs B", "ML", "Live", "2.10", "", "Loss"]),
            row(&["LoL", "Worlds 2024", "C vs D", "ML", "Live", "1.50", "", "Win"]),
            row(&["LoL", "Worlds 2024", "C vs D", "ML", "Live", "abc", "", "Win"]),
        ]);
        let snapshot = load_snapshot(&source).await;

        assert_eq!(snapshot.origin, DataOrigin::Fetched);
        assert_eq!(snapshot.records.len(), 3);
        assert_eq!(snapshot.sport_order, vec!["CS2", "LoL"]);
        assert_eq!(snapshot.top_sport(), Some("CS2"));

        let cs2 = snapshot.sport("CS2").unwrap();
        assert_eq!(cs2.lookup(1.85).unwrap().prematch_count, Some(1));
        assert_eq!(cs2.lookup(2.10).unwrap().live_wr, Some(0.0));

        let lol = snapshot.tournaments.sports.iter().find(|s| s.sport == "LoL").unwrap();
        assert_eq!(lol.tournaments[0].name, "Worlds");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_flagged() {
        let snapshot = load_snapshot(&Unreachable).await;

        assert!(snapshot.records.is_empty());
        assert!(snapshot.sports.is_empty());
        assert!(snapshot.fetch_error().unwrap().contains("503"));

        // An empty sheet is also empty, but not a failure
        let empty = load_snapshot(&FixedRows(Vec::new())).await;
        assert!(empty.records.is_empty());
        assert_eq!(empty.fetch_error(), None);
    }
}
