use async_trait::async_trait;
use logtrail_core::AppResult;
use logtrail_domain::{LogLevel, LogRecord, LogRecordId, NewLogRecord};

/// Default number of records returned by a recent-records listing.
pub const DEFAULT_RECENT_LIMIT: usize = 1000;

/// Filters for listing recent records.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecordQuery {
    /// Only records at this level.
    pub level: Option<LogLevel>,
    /// Only records whose logger name equals this value.
    pub name: Option<String>,
    /// Only records at or after this epoch timestamp.
    pub since: Option<f64>,
    /// Maximum number of records, newest kept.
    pub limit: usize,
}

impl Default for LogRecordQuery {
    fn default() -> Self {
        Self {
            level: None,
            name: None,
            since: None,
            limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

/// Record store port.
#[async_trait]
pub trait LogRecordRepository: Send + Sync {
    /// Stores one record and returns it with its assigned identifier.
    async fn insert(&self, record: NewLogRecord) -> AppResult<LogRecord>;

    /// Returns the number of stored records.
    async fn count(&self) -> AppResult<u64>;

    /// Returns identifiers of records with `timestamp < cutoff`.
    async fn select_ids_older_than(&self, cutoff: f64) -> AppResult<Vec<LogRecordId>>;

    /// Returns identifiers of the `limit` oldest records, ordered by
    /// timestamp then identifier.
    async fn select_oldest_ids(&self, limit: u64) -> AppResult<Vec<LogRecordId>>;

    /// Loads full records for the given identifiers, ordered by identifier.
    async fn select_by_ids(&self, ids: &[LogRecordId]) -> AppResult<Vec<LogRecord>>;

    /// Deletes the given records in one transaction and returns how many
    /// existed. Unknown identifiers are not an error.
    async fn delete_by_ids(&self, ids: &[LogRecordId]) -> AppResult<u64>;

    /// Returns the oldest stored timestamp.
    async fn min_timestamp(&self) -> AppResult<Option<f64>>;

    /// Returns the newest stored timestamp.
    async fn max_timestamp(&self) -> AppResult<Option<f64>>;

    /// Lists the newest matching records in ascending time order.
    async fn list_recent(&self, query: LogRecordQuery) -> AppResult<Vec<LogRecord>>;
}
