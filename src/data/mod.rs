pub mod ingest;
pub mod sheets;
pub mod types;

use async_trait::async_trait;
use sheets::SheetsError;

/// Anything that can hand back the raw bet rows (one `Vec<String>` per sheet row).
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SheetsError>;
}
