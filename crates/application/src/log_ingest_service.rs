use std::sync::Arc;

use tracing::debug;

use logtrail_core::AppResult;
use logtrail_domain::{LogRecord, NewLogRecord};

use crate::log_ports::{LogPublisher, LogRecordQuery, LogRecordRepository};

/// Stores incoming records and fans them out to live subscribers.
#[derive(Clone)]
pub struct LogIngestService {
    repository: Arc<dyn LogRecordRepository>,
    publisher: Option<Arc<dyn LogPublisher>>,
}

impl LogIngestService {
    /// Creates an ingestion service.
    #[must_use]
    pub fn new(repository: Arc<dyn LogRecordRepository>) -> Self {
        Self {
            repository,
            publisher: None,
        }
    }

    /// Adds a live publisher notified after each successful insert.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn LogPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Stores one record and publishes it.
    pub async fn ingest(&self, record: NewLogRecord) -> AppResult<LogRecord> {
        let stored = self.repository.insert(record).await?;
        debug!(
            id = %stored.id,
            name = %stored.name,
            level = %stored.level,
            "log record stored"
        );

        if let Some(publisher) = &self.publisher {
            publisher.publish(&stored);
        }

        Ok(stored)
    }

    /// Lists recent records, oldest first.
    pub async fn list_recent(&self, query: LogRecordQuery) -> AppResult<Vec<LogRecord>> {
        self.repository.list_recent(query).await
    }

    /// Returns the stored record count.
    pub async fn record_count(&self) -> AppResult<u64> {
        self.repository.count().await
    }
}
