use logtrail_application::{LogIngestService, RetentionService};
use logtrail_infrastructure::BroadcastLogPublisher;
use tokio_util::sync::CancellationToken;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ingest_service: LogIngestService,
    pub retention_service: RetentionService,
    pub publisher: BroadcastLogPublisher,
    pub shutdown: CancellationToken,
}
