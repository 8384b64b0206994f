use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::data::types::BetType;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sheet: SheetConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_connect_retry_delay")]
    pub connect_retry_delay_secs: u64,
    #[serde(default = "default_preload_timeout")]
    pub preload_timeout_secs: u64,
    #[serde(default)]
    pub default_bet_type: BetType,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_attempts: default_connect_attempts(),
            connect_retry_delay_secs: default_connect_retry_delay(),
            preload_timeout_secs: default_preload_timeout(),
            default_bet_type: BetType::default(),
        }
    }
}

impl SessionConfig {
    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_delay_secs)
    }

    pub fn preload_timeout(&self) -> Duration {
        Duration::from_secs(self.preload_timeout_secs)
    }
}

fn default_worksheet() -> String { "MATCHBET".to_string() }
fn default_range() -> String { "A2:H".to_string() }
fn default_api_base_url() -> String { "https://sheets.googleapis.com/v4".to_string() }
fn default_connect_attempts() -> u32 { 3 }
fn default_connect_retry_delay() -> u64 { 2 }
fn default_preload_timeout() -> u64 { 60 }

/// Secrets and per-machine overrides, read from the process environment
/// (and `.env` if present).
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub config_path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Environment overrides win over the file.
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(id) = &env.spreadsheet_id {
            self.sheet.spreadsheet_id = id.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheet.spreadsheet_id.trim().is_empty() {
            anyhow::bail!("sheet.spreadsheet_id is empty (set it in the config file or SPREADSHEET_ID)");
        }
        if self.session.connect_attempts == 0 {
            anyhow::bail!("session.connect_attempts must be at least 1");
        }
        Ok(())
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let env = Self {
            api_key: non_empty_var("GOOGLE_SHEETS_API_KEY"),
            access_token: non_empty_var("GOOGLE_SHEETS_ACCESS_TOKEN"),
            spreadsheet_id: non_empty_var("SPREADSHEET_ID"),
            config_path: std::env::var("MATCHBET_CONFIG")
                .unwrap_or_else(|_| "config.toml".to_string()),
        };

        if env.api_key.is_none() && env.access_token.is_none() {
            anyhow::bail!("Neither GOOGLE_SHEETS_API_KEY nor GOOGLE_SHEETS_ACCESS_TOKEN is set");
        }

        Ok(env)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::parse(
            r#"
            [sheet]
            spreadsheet_id = "abc123"
            "#,
        )
        .unwrap();

        assert_eq!(config.sheet.worksheet, "MATCHBET");
        assert_eq!(config.sheet.range, "A2:H");
        assert_eq!(config.session.connect_attempts, 3);
        assert_eq!(config.session.connect_retry_delay(), Duration::from_secs(2));
        assert_eq!(config.session.preload_timeout(), Duration::from_secs(60));
        assert_eq!(config.session.default_bet_type, BetType::Live);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_overrides() {
        let mut config = Config::parse(
            r#"
            [sheet]
            worksheet = "BETS"

            [session]
            preload_timeout_secs = 5
            default_bet_type = "Prematch"
            "#,
        )
        .unwrap();

        assert_eq!(config.sheet.worksheet, "BETS");
        assert_eq!(config.session.preload_timeout_secs, 5);
        assert_eq!(config.session.default_bet_type, BetType::Prematch);

        // Missing id fails validation until the environment provides one
        assert!(config.validate().is_err());
        config.apply_env(&EnvConfig {
            api_key: Some("key".to_string()),
            access_token: None,
            spreadsheet_id: Some("from-env".to_string()),
            config_path: "config.toml".to_string(),
        });
        assert_eq!(config.sheet.spreadsheet_id, "from-env");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_config_parses() {
        let config = Config::parse(include_str!("../config.toml")).unwrap();
        assert_eq!(config.sheet.worksheet, "MATCHBET");
        assert_eq!(config.session.connect_attempts, 3);
    }
}
