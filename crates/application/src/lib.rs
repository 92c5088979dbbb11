//! Application services and ports.

#![forbid(unsafe_code)]

mod log_event;
mod log_ingest_service;
mod log_ports;
mod retention_policy_service;
mod retention_ports;
mod retention_scheduler;
mod retention_service;

#[cfg(test)]
mod test_support;

pub use log_event::{LogEventSource, parse_log_event};
pub use log_ingest_service::LogIngestService;
pub use log_ports::{DEFAULT_RECENT_LIMIT, LogPublisher, LogRecordQuery, LogRecordRepository};
pub use retention_policy_service::RetentionPolicyService;
pub use retention_ports::{RecordArchiver, RetentionConfigRepository};
pub use retention_scheduler::{
    DEFAULT_STOP_TIMEOUT, DEFAULT_WAKE_INTERVAL, RetentionScheduler, ScheduleDecision,
    SchedulerOptions, SchedulerState, evaluate_schedule,
};
pub use retention_service::{
    CleanupResult, DEFAULT_DELETE_BATCH_SIZE, RetentionInfo, RetentionService,
    RetentionStatistics,
};
