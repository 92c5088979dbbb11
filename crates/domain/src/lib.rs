//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod duration;
mod log_record;
mod retention;

pub use duration::{
    RetentionDuration, SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE, describe_duration,
    parse_duration_seconds, render_duration,
};
pub use log_record::{
    LogLevel, LogRecord, LogRecordId, NewLogRecord, datetime_to_timestamp, timestamp_to_datetime,
};
pub use retention::{
    CountBasedRetention, CountBasedRetentionUpdate, DEFAULT_EXPORT_DIRECTORY,
    DEFAULT_INTERVAL_HOURS, DEFAULT_MAX_ENTRIES, DEFAULT_RETENTION_DURATION, ExportFormat,
    ExportSettings, ExportSettingsUpdate, LastExecution, RetentionConfig, RetentionConfigUpdate,
    RetentionSchedule, RetentionScheduleUpdate, TimeBasedRetention, TimeBasedRetentionUpdate,
    format_execution_time,
};
