use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use logtrail_core::{AppError, AppResult};
use logtrail_domain::{LogRecordId, RetentionConfig, RetentionDuration, datetime_to_timestamp};

use super::RetentionService;

/// Identifiers selected under each enabled rule.
#[derive(Debug, Default)]
pub(super) struct CandidateSelection {
    pub(super) time_based: BTreeSet<LogRecordId>,
    pub(super) count_based: BTreeSet<LogRecordId>,
    pub(super) failures: Vec<String>,
}

impl CandidateSelection {
    /// Identifiers selected by either rule, ascending.
    pub(super) fn union(&self) -> Vec<LogRecordId> {
        self.time_based
            .union(&self.count_based)
            .copied()
            .collect()
    }
}

impl RetentionService {
    /// Selects deletion candidates. A failing rule contributes nothing and is
    /// reported in `failures`; the other rule still runs.
    pub(super) async fn select_candidates(
        &self,
        config: &RetentionConfig,
        now: DateTime<Utc>,
    ) -> CandidateSelection {
        let mut selection = CandidateSelection::default();

        if config.time_based.enabled {
            match self
                .select_time_based(config.time_based.duration.as_str(), now)
                .await
            {
                Ok(ids) => selection.time_based = ids.into_iter().collect(),
                Err(error) => {
                    warn!(error = %error, "time-based retention selection failed");
                    selection
                        .failures
                        .push(format!("time-based selection: {error}"));
                }
            }
        }

        if config.count_based.enabled {
            match self.select_count_based(config.count_based.max_entries).await {
                Ok(ids) => selection.count_based = ids.into_iter().collect(),
                Err(error) => {
                    warn!(error = %error, "count-based retention selection failed");
                    selection
                        .failures
                        .push(format!("count-based selection: {error}"));
                }
            }
        }

        debug!(
            time_based = selection.time_based.len(),
            count_based = selection.count_based.len(),
            "retention candidates selected"
        );
        selection
    }

    async fn select_time_based(
        &self,
        duration: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<LogRecordId>> {
        let window = RetentionDuration::parse(duration)?;
        let cutoff = datetime_to_timestamp(now) - window.as_seconds() as f64;
        self.records.select_ids_older_than(cutoff).await
    }

    async fn select_count_based(&self, max_entries: u64) -> AppResult<Vec<LogRecordId>> {
        if max_entries == 0 {
            return Err(AppError::ConfigInvalid(
                "count_based.max_entries must be a positive integer".to_owned(),
            ));
        }

        let total = self.records.count().await?;
        if total <= max_entries {
            return Ok(Vec::new());
        }

        self.records.select_oldest_ids(total - max_entries).await
    }
}
