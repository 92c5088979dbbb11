use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use logtrail_core::{AppError, AppResult};
use logtrail_domain::{
    ExportSettings, LogLevel, LogRecord, LogRecordId, NewLogRecord, RetentionConfig,
    datetime_to_timestamp,
};

use crate::log_ports::{LogRecordQuery, LogRecordRepository};
use crate::retention_ports::{RecordArchiver, RetentionConfigRepository};

#[derive(Default)]
pub(crate) struct FakeLogRecordRepository {
    records: Mutex<Vec<LogRecord>>,
    next_id: AtomicUsize,
    pub(crate) fail_count: AtomicBool,
    pub(crate) fail_select_older: AtomicBool,
    pub(crate) fail_delete_on_call: Mutex<Option<usize>>,
    delete_calls: AtomicUsize,
    pub(crate) counts_after_delete: Mutex<Vec<u64>>,
    pub(crate) batch_sizes: Mutex<Vec<usize>>,
}

impl FakeLogRecordRepository {
    pub(crate) async fn seed_at_offsets(&self, ages: &[Duration]) -> Vec<LogRecordId> {
        let now = Utc::now();
        let mut ids = Vec::with_capacity(ages.len());
        for age in ages {
            let record = NewLogRecord::new(
                datetime_to_timestamp(now - *age),
                "app",
                LogLevel::Info,
                "seeded",
            );
            assert!(record.is_ok());
            let record = record.unwrap_or_else(|_| unreachable!());
            let stored = self.insert(record).await;
            assert!(stored.is_ok());
            let stored = stored.unwrap_or_else(|_| unreachable!());
            ids.push(stored.id);
        }
        ids
    }

    pub(crate) async fn seed_with_timestamps(&self, timestamps: &[f64]) -> Vec<LogRecordId> {
        let mut ids = Vec::with_capacity(timestamps.len());
        for timestamp in timestamps {
            let record = NewLogRecord::new(*timestamp, "app", LogLevel::Info, "seeded");
            assert!(record.is_ok());
            let record = record.unwrap_or_else(|_| unreachable!());
            let stored = self.insert(record).await;
            assert!(stored.is_ok());
            let stored = stored.unwrap_or_else(|_| unreachable!());
            ids.push(stored.id);
        }
        ids
    }

    pub(crate) async fn remaining_ids(&self) -> Vec<LogRecordId> {
        self.records.lock().await.iter().map(|record| record.id).collect()
    }

    fn unavailable(operation: &str) -> AppError {
        AppError::StoreUnavailable(format!("{operation} failed in test store"))
    }
}

#[async_trait]
impl LogRecordRepository for FakeLogRecordRepository {
    async fn insert(&self, record: NewLogRecord) -> AppResult<LogRecord> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = record.into_record(LogRecordId::new(i64::try_from(id).unwrap_or(i64::MAX)));
        self.records.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn count(&self) -> AppResult<u64> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(Self::unavailable("count"));
        }
        Ok(self.records.lock().await.len() as u64)
    }

    async fn select_ids_older_than(&self, cutoff: f64) -> AppResult<Vec<LogRecordId>> {
        if self.fail_select_older.load(Ordering::SeqCst) {
            return Err(Self::unavailable("select older"));
        }
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.timestamp < cutoff)
            .map(|record| record.id)
            .collect())
    }

    async fn select_oldest_ids(&self, limit: u64) -> AppResult<Vec<LogRecordId>> {
        let mut records = self.records.lock().await.clone();
        records.sort_by(|left, right| {
            left.timestamp
                .total_cmp(&right.timestamp)
                .then(left.id.cmp(&right.id))
        });
        Ok(records
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|record| record.id)
            .collect())
    }

    async fn select_by_ids(&self, ids: &[LogRecordId]) -> AppResult<Vec<LogRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| ids.contains(&record.id))
            .cloned()
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[LogRecordId]) -> AppResult<u64> {
        let call = self.delete_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.batch_sizes.lock().await.push(ids.len());
        if *self.fail_delete_on_call.lock().await == Some(call) {
            return Err(Self::unavailable("delete"));
        }

        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| !ids.contains(&record.id));
        let deleted = (before - records.len()) as u64;
        let remaining = records.len() as u64;
        drop(records);

        self.counts_after_delete.lock().await.push(remaining);
        Ok(deleted)
    }

    async fn min_timestamp(&self) -> AppResult<Option<f64>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .map(|record| record.timestamp)
            .reduce(f64::min))
    }

    async fn max_timestamp(&self) -> AppResult<Option<f64>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .map(|record| record.timestamp)
            .reduce(f64::max))
    }

    async fn list_recent(&self, query: LogRecordQuery) -> AppResult<Vec<LogRecord>> {
        let records = self.records.lock().await;
        let matching: Vec<LogRecord> = records
            .iter()
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
        let skip = matching.len().saturating_sub(query.limit);
        Ok(matching.into_iter().skip(skip).collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeRetentionConfigRepository {
    pub(crate) document: Mutex<Option<RetentionConfig>>,
    pub(crate) saves: AtomicUsize,
    pub(crate) fail_save: AtomicBool,
    pub(crate) load_delay_ms: AtomicU64,
}

impl FakeRetentionConfigRepository {
    pub(crate) fn with_document(config: RetentionConfig) -> Self {
        Self {
            document: Mutex::new(Some(config)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RetentionConfigRepository for FakeRetentionConfigRepository {
    async fn load(&self) -> AppResult<Option<RetentionConfig>> {
        let delay = self.load_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(StdDuration::from_millis(delay)).await;
        }
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, config: &RetentionConfig) -> AppResult<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(AppError::Internal("policy document is read-only".to_owned()));
        }
        *self.document.lock().await = Some(config.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeRecordArchiver {
    pub(crate) exported: Mutex<Vec<Vec<LogRecordId>>>,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl RecordArchiver for FakeRecordArchiver {
    async fn export(&self, records: &[LogRecord], settings: &ExportSettings) -> AppResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::ExportFailed("disk full".to_owned()));
        }
        self.exported
            .lock()
            .await
            .push(records.iter().map(|record| record.id).collect());
        Ok(format!(
            "{}/deleted_logs.{}",
            settings.output_directory,
            settings.format.file_extension()
        ))
    }
}
