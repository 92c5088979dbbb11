use std::sync::Arc;

use logtrail_application::LogRecordRepository;
use logtrail_domain::{LogLevel, NewLogRecord};
use logtrail_infrastructure::InMemoryLogRecordRepository;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::api_services::build_app_state;
use crate::state::AppState;

pub struct TestApp {
    pub state: AppState,
    pub records: Arc<InMemoryLogRecordRepository>,
    pub directory: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let directory = tempfile::tempdir();
        assert!(directory.is_ok());
        let directory = directory.unwrap_or_else(|_| unreachable!());
        let records = Arc::new(InMemoryLogRecordRepository::new());
        let config_path = directory.path().join("retention_config.yml");
        let state = build_app_state(
            records.clone(),
            &config_path.display().to_string(),
            CancellationToken::new(),
        );

        let app = Self {
            state,
            records,
            directory,
        };
        app.set_export_directory().await;
        app
    }

    pub fn export_directory(&self) -> std::path::PathBuf {
        self.directory.path().join("exports")
    }

    pub async fn seed(&self, timestamps: &[f64]) {
        for timestamp in timestamps {
            let record = NewLogRecord::new(*timestamp, "app", LogLevel::Info, "seeded");
            assert!(record.is_ok());
            let record = record.unwrap_or_else(|_| unreachable!());
            assert!(self.records.insert(record).await.is_ok());
        }
    }

    async fn set_export_directory(&self) {
        let policy = self.state.retention_service.policy();
        let config = policy.get().await;
        assert!(config.is_ok());
        let mut config = config.unwrap_or_else(|_| unreachable!());
        config.export.output_directory = self.export_directory().display().to_string();
        assert!(policy.save(config).await.is_ok());
    }
}
