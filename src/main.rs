mod config;
mod console;
mod data;
mod report;
mod session;
mod stats;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::{Config, EnvConfig};
use console::Console;
use data::sheets::{with_retries, Credentials, SheetsClient};
use session::loader::Session;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the console
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Matchbet EV viewer starting...");

    let env_config = EnvConfig::load()?;
    tracing::info!("Loading configuration from {}", env_config.config_path);
    let mut config = Config::load(&env_config.config_path)?;
    config.apply_env(&env_config);
    config.validate()?;

    let credentials = Credentials::from_env(&env_config)?;
    let client = SheetsClient::new(&config.sheet, credentials);

    let attempts = config.session.connect_attempts;
    let title = with_retries(attempts, config.session.connect_retry_delay(), |_| client.open())
        .await
        .with_context(|| format!("Failed to open spreadsheet after {} attempts", attempts))?;
    tracing::info!("Connected to spreadsheet '{}'", title);

    let mut session = Session::new(Arc::new(client));

    tracing::info!("Preloading bets from {}...", config.sheet.worksheet);
    let snapshot = session
        .preload(config.session.preload_timeout())
        .await
        .context("Failed to preload data")?;

    if let Some(reason) = snapshot.fetch_error() {
        tracing::error!("Preload fetched no data: {}", reason);
    } else {
        tracing::info!(
            "Preloaded {} bets across {} sports",
            snapshot.records.len(),
            snapshot.sports.len()
        );
    }

    Console::new(session, config.session.default_bet_type).run().await?;

    tracing::info!("Shutting down...");
    Ok(())
}
