use logtrail_application::{CleanupResult, RetentionInfo};
use logtrail_domain::{
    CountBasedRetentionUpdate, ExportSettingsUpdate, RetentionConfigUpdate,
    RetentionScheduleUpdate, TimeBasedRetentionUpdate,
};
use serde::{Deserialize, Serialize};

/// Incoming partial update of the retention policy, keyed by section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRetentionSettingsRequest {
    pub time_based: Option<TimeBasedSettingsRequest>,
    pub count_based: Option<CountBasedSettingsRequest>,
    pub export: Option<ExportSettingsRequest>,
    pub schedule: Option<ScheduleSettingsRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeBasedSettingsRequest {
    pub enabled: Option<bool>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountBasedSettingsRequest {
    pub enabled: Option<bool>,
    pub max_entries: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportSettingsRequest {
    pub enabled: Option<bool>,
    pub format: Option<String>,
    pub output_directory: Option<String>,
    pub include_timestamp: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleSettingsRequest {
    pub on_startup: Option<bool>,
    pub interval_hours: Option<i64>,
}

impl From<UpdateRetentionSettingsRequest> for RetentionConfigUpdate {
    fn from(value: UpdateRetentionSettingsRequest) -> Self {
        Self {
            time_based: value.time_based.map(|section| TimeBasedRetentionUpdate {
                enabled: section.enabled,
                duration: section.duration,
            }),
            count_based: value.count_based.map(|section| CountBasedRetentionUpdate {
                enabled: section.enabled,
                max_entries: section.max_entries,
            }),
            export: value.export.map(|section| ExportSettingsUpdate {
                enabled: section.enabled,
                format: section.format,
                output_directory: section.output_directory,
                include_timestamp: section.include_timestamp,
            }),
            schedule: value.schedule.map(|section| RetentionScheduleUpdate {
                on_startup: section.on_startup,
                interval_hours: section.interval_hours,
            }),
        }
    }
}

/// Response for a settings update.
#[derive(Debug, Serialize)]
pub struct RetentionSettingsResponse {
    pub message: &'static str,
    pub settings: RetentionInfo,
}

/// Optional body of a manual cleanup request.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CleanupRequest {
    #[serde(default)]
    pub dry_run: bool,
}

/// Response for a cleanup or preview run.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: &'static str,
    pub result: CleanupResult,
}

/// Incoming duration to validate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DurationValidationRequest {
    pub duration: Option<String>,
}

/// Accepted duration with its breakdown.
#[derive(Debug, Serialize)]
pub struct DurationValidationResponse {
    pub valid: bool,
    pub duration: String,
    pub canonical: String,
    pub seconds: u64,
    pub human_readable: String,
}

/// Rejected duration.
#[derive(Debug, Serialize)]
pub struct DurationValidationFailure {
    pub valid: bool,
    pub error: String,
}
