use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use logtrail_core::{AppError, AppResult};

use crate::retention_service::{CleanupResult, RetentionService};

mod schedule;

pub use schedule::{ScheduleDecision, evaluate_schedule};

/// Default time between schedule checks.
pub const DEFAULT_WAKE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default bound on waiting for the worker to exit.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of the background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// No worker is running.
    Stopped,
    /// The worker is waiting or running a pass.
    Running,
    /// A stop was requested and the worker has not exited yet.
    Stopping,
}

/// Tuning for the background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Time between schedule checks.
    pub wake_interval: Duration,
    /// Whether a degraded or failed pass still records `last_execution`.
    pub advance_on_failure: bool,
    /// Bound on waiting for the worker during `stop`.
    pub stop_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            wake_interval: DEFAULT_WAKE_INTERVAL,
            advance_on_failure: true,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

struct WorkerSlot {
    state: SchedulerState,
    cancellation: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerSlot {
    /// Moves a detached `Stopping` worker to `Stopped` once its task has exited.
    ///
    /// While `stop` is still waiting the handle is out of the slot and the
    /// state is left alone.
    fn settle(&mut self) {
        if self.state != SchedulerState::Stopping {
            return;
        }
        if self.handle.as_ref().is_some_and(JoinHandle::is_finished) {
            self.handle = None;
            self.state = SchedulerState::Stopped;
        }
    }
}

/// Runs retention passes on the configured cadence.
#[derive(Clone)]
pub struct RetentionScheduler {
    retention: RetentionService,
    options: SchedulerOptions,
    worker: Arc<Mutex<WorkerSlot>>,
}

impl RetentionScheduler {
    /// Creates a stopped scheduler.
    #[must_use]
    pub fn new(retention: RetentionService, options: SchedulerOptions) -> Self {
        Self {
            retention,
            options,
            worker: Arc::new(Mutex::new(WorkerSlot {
                state: SchedulerState::Stopped,
                cancellation: None,
                handle: None,
            })),
        }
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> SchedulerState {
        let mut worker = self.worker.lock().await;
        worker.settle();
        worker.state
    }

    /// Spawns the background worker.
    pub async fn start(&self) -> AppResult<()> {
        let mut worker = self.worker.lock().await;
        worker.settle();
        match worker.state {
            SchedulerState::Stopped => {}
            SchedulerState::Running => {
                return Err(AppError::Conflict(
                    "retention scheduler is already running".to_owned(),
                ));
            }
            SchedulerState::Stopping => {
                return Err(AppError::Conflict(
                    "retention scheduler is still finishing a pass".to_owned(),
                ));
            }
        }

        let cancellation = CancellationToken::new();
        let scheduler = self.clone();
        let token = cancellation.clone();
        let handle = tokio::spawn(async move { scheduler.run_loop(token).await });

        worker.state = SchedulerState::Running;
        worker.cancellation = Some(cancellation);
        worker.handle = Some(handle);

        info!(
            wake_interval_seconds = self.options.wake_interval.as_secs(),
            advance_on_failure = self.options.advance_on_failure,
            "retention scheduler started"
        );
        Ok(())
    }

    /// Requests the worker to exit and waits for it within the stop timeout.
    ///
    /// A pass already in flight runs to completion. When it outlasts the
    /// timeout the scheduler stays `Stopping` until the worker exits, and
    /// `start` is refused meanwhile. Stopping a stopped scheduler is a no-op.
    pub async fn stop(&self) {
        let (cancellation, handle) = {
            let mut worker = self.worker.lock().await;
            if worker.state != SchedulerState::Running {
                return;
            }
            worker.state = SchedulerState::Stopping;
            (worker.cancellation.take(), worker.handle.take())
        };

        if let Some(cancellation) = cancellation {
            cancellation.cancel();
        }

        let Some(mut handle) = handle else {
            self.worker.lock().await.state = SchedulerState::Stopped;
            return;
        };

        match tokio::time::timeout(self.options.stop_timeout, &mut handle).await {
            Ok(Ok(())) => info!("retention scheduler stopped"),
            Ok(Err(join_error)) => {
                error!(error = %join_error, "retention scheduler task ended abnormally");
            }
            Err(_) => {
                warn!(
                    timeout_seconds = self.options.stop_timeout.as_secs(),
                    "retention scheduler did not stop in time, pass still running"
                );
                self.worker.lock().await.handle = Some(handle);
                return;
            }
        }

        self.worker.lock().await.state = SchedulerState::Stopped;
    }

    /// Runs the startup pass regardless of the interval and records it.
    pub async fn run_startup_pass(&self) -> AppResult<CleanupResult> {
        info!("running startup retention pass");
        self.run_pass().await
    }

    /// Runs one pass now and records it, applying the advance policy.
    pub async fn run_pass(&self) -> AppResult<CleanupResult> {
        let outcome = self.retention.cleanup(false).await;
        let succeeded = match &outcome {
            Ok(result) if result.is_degraded() => {
                warn!(
                    records_deleted = result.records_deleted,
                    failures = ?result.failures,
                    "retention pass completed with failures"
                );
                false
            }
            Ok(_) => true,
            Err(error) => {
                error!(error = %error, "retention pass failed");
                false
            }
        };

        if succeeded || self.options.advance_on_failure {
            if let Err(error) = self
                .retention
                .policy()
                .update_last_execution(Utc::now())
                .await
            {
                warn!(error = %error, "failed to record retention pass time");
            }
        } else {
            warn!("retention pass not recorded, it will be retried at the next wake");
        }

        outcome
    }

    async fn run_loop(self, cancellation: CancellationToken) {
        loop {
            if cancellation.is_cancelled() {
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                () = cancellation.cancelled() => break,
                () = tokio::time::sleep(self.options.wake_interval) => {}
            }
        }
    }

    async fn run_cycle(&self) {
        let config = match self.retention.policy().load().await {
            Ok(config) => config,
            Err(error) => {
                warn!(error = %error, "failed to read retention policy, skipping cycle");
                return;
            }
        };

        let decision = evaluate_schedule(&config.schedule, Utc::now());
        match &decision {
            ScheduleDecision::FirstExecution => info!("running first scheduled retention pass"),
            ScheduleDecision::UnreadableLastExecution(raw) => warn!(
                last_execution = %raw,
                "unreadable last retention pass time, running now"
            ),
            ScheduleDecision::Due { elapsed_hours } => info!(
                elapsed_hours = *elapsed_hours,
                interval_hours = config.schedule.interval_hours,
                "scheduled retention pass is due"
            ),
            ScheduleDecision::NotDue { .. } => {}
        }

        if decision.should_run() {
            // Errors are logged inside; the loop keeps running.
            let _ = self.run_pass().await;
        }
    }
}

#[cfg(test)]
mod tests;
