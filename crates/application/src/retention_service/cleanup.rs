use chrono::Utc;
use tracing::{debug, info, warn};

use logtrail_core::AppResult;
use logtrail_domain::{ExportSettings, LogRecordId};

use super::{CleanupResult, RetentionService};

impl RetentionService {
    /// Runs one retention pass.
    ///
    /// Selection, archiving and deletion failures are absorbed into
    /// `CleanupResult::failures`; only a failure to read the policy itself is
    /// returned as an error.
    pub async fn cleanup(&self, dry_run: bool) -> AppResult<CleanupResult> {
        let config = self.policy.get().await?;
        let selection = self.select_candidates(&config, Utc::now()).await;
        let doomed = selection.union();

        let mut result = CleanupResult {
            time_based_deletions: selection.time_based.len() as u64,
            count_based_deletions: selection.count_based.len() as u64,
            dry_run,
            failures: selection.failures,
            ..CleanupResult::default()
        };

        if doomed.is_empty() {
            debug!(dry_run, "retention pass found nothing to delete");
            return Ok(result);
        }

        if dry_run {
            result.records_deleted = doomed.len() as u64;
            info!(
                records = result.records_deleted,
                time_based = result.time_based_deletions,
                count_based = result.count_based_deletions,
                "retention dry run complete"
            );
            return Ok(result);
        }

        if config.export.enabled {
            match self.export_doomed(&doomed, &config.export).await {
                Ok(location) => result.export_file = Some(location),
                Err(error) => {
                    warn!(error = %error, "retention export failed, continuing with deletion");
                    result.failures.push(format!("export: {error}"));
                }
            }
        }

        self.delete_in_batches(&doomed, &mut result).await;

        info!(
            records_deleted = result.records_deleted,
            time_based = result.time_based_deletions,
            count_based = result.count_based_deletions,
            export_file = result.export_file.as_deref().unwrap_or("none"),
            failures = result.failures.len(),
            "retention pass complete"
        );
        Ok(result)
    }

    /// Computes what a pass would delete without changing anything.
    pub async fn preview(&self) -> AppResult<CleanupResult> {
        self.cleanup(true).await
    }

    async fn export_doomed(
        &self,
        doomed: &[LogRecordId],
        settings: &ExportSettings,
    ) -> AppResult<String> {
        let records = self.records.select_by_ids(doomed).await?;
        self.archiver.export(&records, settings).await
    }

    async fn delete_in_batches(&self, doomed: &[LogRecordId], result: &mut CleanupResult) {
        for (index, batch) in doomed.chunks(self.delete_batch_size).enumerate() {
            match self.records.delete_by_ids(batch).await {
                Ok(deleted) => {
                    result.records_deleted += deleted;
                    debug!(
                        batch = index + 1,
                        requested = batch.len(),
                        deleted,
                        "retention batch deleted"
                    );
                }
                Err(error) => {
                    warn!(
                        batch = index + 1,
                        error = %error,
                        "retention batch failed, stopping pass"
                    );
                    result
                        .failures
                        .push(format!("delete batch {}: {error}", index + 1));
                    break;
                }
            }
        }
    }
}
