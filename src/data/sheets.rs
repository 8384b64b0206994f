use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{EnvConfig, SheetConfig};
use crate::data::RowSource;

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("No Google Sheets credentials configured")]
    MissingCredentials,

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub enum Credentials {
    ApiKey(String),
    AccessToken(String),
}

impl Credentials {
    /// An OAuth access token is preferred over an API key when both are set.
    pub fn from_env(env: &EnvConfig) -> Result<Self, SheetsError> {
        match (&env.access_token, &env.api_key) {
            (Some(token), _) => Ok(Credentials::AccessToken(token.clone())),
            (None, Some(key)) => Ok(Credentials::ApiKey(key.clone())),
            (None, None) => Err(SheetsError::MissingCredentials),
        }
    }
}

/// Client for the Google Sheets v4 values API, bound to one worksheet range.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    worksheet: String,
    range: String,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    properties: SpreadsheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

impl SheetsClient {
    pub fn new(config: &SheetConfig, credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet.clone(),
            range: config.range.clone(),
            credentials,
        }
    }

    /// Open the spreadsheet and return its title. Used as the startup
    /// connectivity and credentials check.
    pub async fn open(&self) -> Result<String, SheetsError> {
        let url = self.url(&["spreadsheets", &self.spreadsheet_id])?;

        let response = self
            .authorize(self.client.get(url).query(&[("fields", "properties.title")]))
            .send()
            .await?;

        let meta: SpreadsheetMeta = Self::check_status(response).await?.json().await?;
        Ok(meta.properties.title)
    }

    /// Fetch the configured range as rows of text cells.
    pub async fn fetch_values(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url()?;

        let response = self.authorize(self.client.get(url)).send().await?;
        let body: ValueRange = Self::check_status(response).await?.json().await?;

        let rows: Vec<Vec<String>> = body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();

        info!("Fetched {} rows from {}!{}", rows.len(), self.worksheet, self.range);
        Ok(rows)
    }

    fn values_url(&self) -> Result<Url, SheetsError> {
        let a1 = format!("{}!{}", self.worksheet, self.range);
        self.url(&["spreadsheets", &self.spreadsheet_id, "values", &a1])
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Credentials::AccessToken(token) => request.bearer_auth(token),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SheetsError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        self.fetch_values().await
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
/// The closure receives the 1-based attempt number.
pub async fn with_retries<T, E, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Connection attempt {} of {} failed: {}", attempt, attempts, e);
                if attempt >= attempts {
                    return Err(e);
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client(base_url: &str, worksheet: &str) -> SheetsClient {
        let config = SheetConfig {
            spreadsheet_id: "sheet-id".to_string(),
            worksheet: worksheet.to_string(),
            range: "A2:H".to_string(),
            api_base_url: base_url.to_string(),
        };
        SheetsClient::new(&config, Credentials::ApiKey("k".to_string()))
    }

    #[test]
    fn test_values_url() {
        let c = client("https://sheets.googleapis.com/v4", "MATCHBET");
        assert_eq!(
            c.values_url().unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/MATCHBET!A2:H"
        );
    }

    #[test]
    fn test_values_url_escapes_worksheet_and_trailing_slash() {
        let c = client("https://sheets.googleapis.com/v4/", "Match bets");
        assert_eq!(
            c.values_url().unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/Match%20bets!A2:H"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let c = client("not a url", "MATCHBET");
        assert!(matches!(c.values_url(), Err(SheetsError::InvalidUrl(_))));
    }

    #[test]
    fn test_value_range_decoding() {
        let body: ValueRange = serde_json::from_str(
            r#"{"range":"MATCHBET!A2:H3","majorDimension":"ROWS","values":[["CS2","Major",1.85,null]]}"#,
        )
        .unwrap();
        let row: Vec<String> = body.values.into_iter().next().unwrap()
            .into_iter()
            .map(cell_to_string)
            .collect();
        assert_eq!(row, vec!["CS2", "Major", "1.85", ""]);

        // An empty range omits "values" entirely
        let empty: ValueRange = serde_json::from_str(r#"{"range":"MATCHBET!A2:H"}"#).unwrap();
        assert!(empty.values.is_empty());
    }

    #[test]
    fn test_credentials_preference() {
        let mut env = EnvConfig {
            api_key: Some("key".to_string()),
            access_token: Some("token".to_string()),
            spreadsheet_id: None,
            config_path: "config.toml".to_string(),
        };
        assert!(matches!(Credentials::from_env(&env), Ok(Credentials::AccessToken(_))));

        env.access_token = None;
        assert!(matches!(Credentials::from_env(&env), Ok(Credentials::ApiKey(_))));

        env.api_key = None;
        assert!(matches!(Credentials::from_env(&env), Err(SheetsError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_retries(3, Duration::ZERO, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 { Err(format!("attempt {}", attempt)) } else { Ok(attempt) }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_give_up_with_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = with_retries(3, Duration::ZERO, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("attempt {}", attempt)) }
        })
        .await;

        assert_eq!(result, Err("attempt 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
