use std::sync::Arc;

use logtrail_application::{
    LogIngestService, LogRecordRepository, RetentionPolicyService, RetentionScheduler,
    RetentionService, SchedulerOptions,
};
use logtrail_infrastructure::{
    BroadcastLogPublisher, CsvRecordArchiver, YamlRetentionConfigRepository,
};
use tokio_util::sync::CancellationToken;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(
    records: Arc<dyn LogRecordRepository>,
    retention_config_path: &str,
    shutdown: CancellationToken,
) -> AppState {
    let publisher = BroadcastLogPublisher::default();
    let policy_service = RetentionPolicyService::new(Arc::new(
        YamlRetentionConfigRepository::new(retention_config_path),
    ));

    AppState {
        ingest_service: LogIngestService::new(records.clone())
            .with_publisher(Arc::new(publisher.clone())),
        retention_service: RetentionService::new(
            records,
            policy_service,
            Arc::new(CsvRecordArchiver::new()),
        ),
        publisher,
        shutdown,
    }
}

pub fn build_scheduler(state: &AppState, config: &ApiConfig) -> RetentionScheduler {
    RetentionScheduler::new(
        state.retention_service.clone(),
        SchedulerOptions {
            wake_interval: config.wake_interval,
            advance_on_failure: config.advance_on_failure,
            ..SchedulerOptions::default()
        },
    )
}
