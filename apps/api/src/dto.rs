use serde::Serialize;

mod logs;
mod retention;

pub use logs::{IngestResponse, LogQueryParams, LogRecordResponse};
pub use retention::{
    CleanupRequest, CleanupResponse, DurationValidationFailure, DurationValidationRequest,
    DurationValidationResponse, RetentionSettingsResponse, UpdateRetentionSettingsRequest,
};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: HealthDependencyStatus,
}

/// Health detail for one backing dependency.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
