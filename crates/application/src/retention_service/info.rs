use chrono::Utc;

use logtrail_core::AppResult;
use logtrail_domain::timestamp_to_datetime;

use super::{RetentionInfo, RetentionService, RetentionStatistics};

impl RetentionService {
    /// Returns the active policy with current store statistics.
    ///
    /// Candidate counts come from the same selection a pass would run.
    pub async fn retention_info(&self) -> AppResult<RetentionInfo> {
        let config = self.policy.get().await?;
        let total_records = self.records.count().await?;
        let oldest_record = self
            .records
            .min_timestamp()
            .await?
            .and_then(timestamp_to_datetime);
        let newest_record = self
            .records
            .max_timestamp()
            .await?
            .and_then(timestamp_to_datetime);

        let selection = self.select_candidates(&config, Utc::now()).await;
        let statistics = RetentionStatistics {
            total_records,
            oldest_record,
            newest_record,
            time_based_candidates: selection.time_based.len() as u64,
            count_based_candidates: selection.count_based.len() as u64,
            total_candidates: selection.union().len() as u64,
        };

        Ok(RetentionInfo { config, statistics })
    }
}
