//! Command handlers, one module per subcommand.

use std::path::PathBuf;
use std::sync::Arc;

use logtrail_application::{RetentionPolicyService, RetentionService};
use logtrail_core::AppResult;
use logtrail_infrastructure::{
    CsvRecordArchiver, SqliteLogRecordRepository, YamlRetentionConfigRepository, connect_sqlite,
};

pub mod cleanup;
pub mod show;
pub mod update;

/// Locations shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config_path: PathBuf,
    pub database_url: String,
}

impl CommandContext {
    pub fn policy_service(&self) -> RetentionPolicyService {
        RetentionPolicyService::new(Arc::new(YamlRetentionConfigRepository::new(
            self.config_path.clone(),
        )))
    }

    /// Opens the record store and wires the retention manager over it.
    pub async fn retention_service(&self) -> AppResult<RetentionService> {
        let pool = connect_sqlite(&self.database_url, 1).await?;

        Ok(RetentionService::new(
            Arc::new(SqliteLogRecordRepository::new(pool)),
            self.policy_service(),
            Arc::new(CsvRecordArchiver::new()),
        ))
    }
}
