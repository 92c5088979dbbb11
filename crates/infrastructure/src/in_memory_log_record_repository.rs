use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use logtrail_application::{LogRecordQuery, LogRecordRepository};
use logtrail_core::AppResult;
use logtrail_domain::{LogRecord, LogRecordId, NewLogRecord};

#[derive(Default)]
struct Store {
    next_id: i64,
    records: BTreeMap<LogRecordId, LogRecord>,
}

/// Process-local record store for tests and ephemeral runs.
#[derive(Default)]
pub struct InMemoryLogRecordRepository {
    store: RwLock<Store>,
}

impl InMemoryLogRecordRepository {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogRecordRepository for InMemoryLogRecordRepository {
    async fn insert(&self, record: NewLogRecord) -> AppResult<LogRecord> {
        let mut store = self.store.write().await;
        store.next_id += 1;
        let stored = record.into_record(LogRecordId::new(store.next_id));
        store.records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.store.read().await.records.len() as u64)
    }

    async fn select_ids_older_than(&self, cutoff: f64) -> AppResult<Vec<LogRecordId>> {
        Ok(self
            .store
            .read()
            .await
            .records
            .values()
            .filter(|record| record.timestamp < cutoff)
            .map(|record| record.id)
            .collect())
    }

    async fn select_oldest_ids(&self, limit: u64) -> AppResult<Vec<LogRecordId>> {
        let store = self.store.read().await;
        let mut by_age: Vec<(f64, LogRecordId)> = store
            .records
            .values()
            .map(|record| (record.timestamp, record.id))
            .collect();
        by_age.sort_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));

        Ok(by_age
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(_, id)| id)
            .collect())
    }

    async fn select_by_ids(&self, ids: &[LogRecordId]) -> AppResult<Vec<LogRecord>> {
        let store = self.store.read().await;
        let mut records: Vec<LogRecord> = ids
            .iter()
            .filter_map(|id| store.records.get(id).cloned())
            .collect();
        records.sort_by_key(|record| record.id);
        records.dedup_by_key(|record| record.id);
        Ok(records)
    }

    async fn delete_by_ids(&self, ids: &[LogRecordId]) -> AppResult<u64> {
        let mut store = self.store.write().await;
        Ok(ids
            .iter()
            .filter(|id| store.records.remove(*id).is_some())
            .count() as u64)
    }

    async fn min_timestamp(&self) -> AppResult<Option<f64>> {
        Ok(self
            .store
            .read()
            .await
            .records
            .values()
            .map(|record| record.timestamp)
            .reduce(f64::min))
    }

    async fn max_timestamp(&self) -> AppResult<Option<f64>> {
        Ok(self
            .store
            .read()
            .await
            .records
            .values()
            .map(|record| record.timestamp)
            .reduce(f64::max))
    }

    async fn list_recent(&self, query: LogRecordQuery) -> AppResult<Vec<LogRecord>> {
        let store = self.store.read().await;
        let mut matching: Vec<LogRecord> = store
            .records
            .values()
            .filter(|record| query.level.is_none_or(|level| record.level == level))
            .filter(|record| {
                query
                    .name
                    .as_deref()
                    .is_none_or(|name| record.name == name)
            })
            .filter(|record| query.since.is_none_or(|since| record.timestamp >= since))
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            left.timestamp
                .total_cmp(&right.timestamp)
                .then(left.id.cmp(&right.id))
        });

        let skip = matching.len().saturating_sub(query.limit);
        Ok(matching.into_iter().skip(skip).collect())
    }
}
