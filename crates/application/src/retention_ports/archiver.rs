use async_trait::async_trait;
use logtrail_core::AppResult;
use logtrail_domain::{ExportSettings, LogRecord};

/// Writes an archive of records that are about to be deleted.
#[async_trait]
pub trait RecordArchiver: Send + Sync {
    /// Writes `records` according to `settings` and returns the archive location.
    async fn export(&self, records: &[LogRecord], settings: &ExportSettings) -> AppResult<String>;
}
