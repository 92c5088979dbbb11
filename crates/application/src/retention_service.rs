use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use logtrail_domain::RetentionConfig;

use crate::log_ports::LogRecordRepository;
use crate::retention_policy_service::RetentionPolicyService;
use crate::retention_ports::RecordArchiver;

mod candidates;
mod cleanup;
mod info;

/// Number of identifiers deleted per store transaction.
pub const DEFAULT_DELETE_BATCH_SIZE: usize = 1000;

/// Outcome of one retention pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupResult {
    /// Records removed, or that would be removed on a dry run.
    pub records_deleted: u64,
    /// Archive location, when one was written.
    pub export_file: Option<String>,
    /// Candidates selected by the age rule, before union.
    pub time_based_deletions: u64,
    /// Candidates selected by the size rule, before union.
    pub count_based_deletions: u64,
    /// Whether the store was left untouched.
    pub dry_run: bool,
    /// Failures absorbed during the pass.
    pub failures: Vec<String>,
}

impl CleanupResult {
    /// Returns true when the pass absorbed at least one failure.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Store statistics shown next to the retention policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetentionStatistics {
    /// Stored record count.
    pub total_records: u64,
    /// Time of the oldest stored record.
    pub oldest_record: Option<DateTime<Utc>>,
    /// Time of the newest stored record.
    pub newest_record: Option<DateTime<Utc>>,
    /// Records the age rule would remove now.
    pub time_based_candidates: u64,
    /// Records the size rule would remove now.
    pub count_based_candidates: u64,
    /// Records a pass would remove now.
    pub total_candidates: u64,
}

/// Current policy together with store statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionInfo {
    /// Active policy.
    pub config: RetentionConfig,
    /// Store statistics.
    pub statistics: RetentionStatistics,
}

/// Applies the retention policy to the record store.
#[derive(Clone)]
pub struct RetentionService {
    records: Arc<dyn LogRecordRepository>,
    policy: RetentionPolicyService,
    archiver: Arc<dyn RecordArchiver>,
    delete_batch_size: usize,
}

impl RetentionService {
    /// Creates a retention service.
    #[must_use]
    pub fn new(
        records: Arc<dyn LogRecordRepository>,
        policy: RetentionPolicyService,
        archiver: Arc<dyn RecordArchiver>,
    ) -> Self {
        Self {
            records,
            policy,
            archiver,
            delete_batch_size: DEFAULT_DELETE_BATCH_SIZE,
        }
    }

    /// Overrides the number of identifiers deleted per transaction.
    #[must_use]
    pub fn with_delete_batch_size(mut self, delete_batch_size: usize) -> Self {
        self.delete_batch_size = delete_batch_size.max(1);
        self
    }

    /// Returns the policy service this manager reads from.
    #[must_use]
    pub fn policy(&self) -> &RetentionPolicyService {
        &self.policy
    }
}
