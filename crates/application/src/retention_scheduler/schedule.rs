use chrono::{DateTime, Utc};

use logtrail_domain::{LastExecution, RetentionSchedule, SECONDS_PER_HOUR};

/// Whether a scheduled wake should run a retention pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleDecision {
    /// No pass has ever been recorded.
    FirstExecution,
    /// The stored marker could not be read; runs rather than stalling forever.
    UnreadableLastExecution(String),
    /// The interval has elapsed.
    Due {
        /// Hours since the last pass.
        elapsed_hours: f64,
    },
    /// The interval has not elapsed yet.
    NotDue {
        /// Hours since the last pass.
        elapsed_hours: f64,
    },
}

impl ScheduleDecision {
    /// Returns true when a pass should run.
    #[must_use]
    pub fn should_run(&self) -> bool {
        !matches!(self, Self::NotDue { .. })
    }
}

/// Decides whether a pass is due at `now`.
#[must_use]
pub fn evaluate_schedule(schedule: &RetentionSchedule, now: DateTime<Utc>) -> ScheduleDecision {
    match schedule.last_execution() {
        LastExecution::Never => ScheduleDecision::FirstExecution,
        LastExecution::Unreadable(raw) => ScheduleDecision::UnreadableLastExecution(raw),
        LastExecution::At(last) => {
            let elapsed_seconds = (now - last).num_milliseconds() as f64 / 1000.0;
            let elapsed_hours = elapsed_seconds / SECONDS_PER_HOUR as f64;
            if elapsed_hours >= f64::from(schedule.interval_hours) {
                ScheduleDecision::Due { elapsed_hours }
            } else {
                ScheduleDecision::NotDue { elapsed_hours }
            }
        }
    }
}
