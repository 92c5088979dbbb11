use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, Utc};

use logtrail_core::AppError;
use logtrail_domain::{LastExecution, RetentionConfig};

use crate::log_ports::LogRecordRepository;
use crate::retention_policy_service::RetentionPolicyService;
use crate::retention_service::RetentionService;
use crate::test_support::{
    FakeLogRecordRepository, FakeRecordArchiver, FakeRetentionConfigRepository,
};

use super::{RetentionScheduler, SchedulerOptions, SchedulerState};

struct Harness {
    records: Arc<FakeLogRecordRepository>,
    documents: Arc<FakeRetentionConfigRepository>,
    archiver: Arc<FakeRecordArchiver>,
    scheduler: RetentionScheduler,
}

fn harness(last_run_hours_ago: Option<i64>, options: SchedulerOptions) -> Harness {
    let mut config = RetentionConfig::default();
    config.time_based.duration = "1h".to_owned();
    config.schedule.interval_hours = 24;
    if let Some(hours_ago) = last_run_hours_ago {
        config
            .schedule
            .record_execution(Utc::now() - Duration::hours(hours_ago));
    }

    let records = Arc::new(FakeLogRecordRepository::default());
    let documents = Arc::new(FakeRetentionConfigRepository::with_document(config));
    let archiver = Arc::new(FakeRecordArchiver::default());
    let policy = RetentionPolicyService::new(documents.clone());
    let retention = RetentionService::new(records.clone(), policy, archiver.clone());

    Harness {
        records,
        documents,
        archiver,
        scheduler: RetentionScheduler::new(retention, options),
    }
}

async fn stored_marker(documents: &FakeRetentionConfigRepository) -> LastExecution {
    documents
        .document
        .lock()
        .await
        .clone()
        .unwrap_or_default()
        .schedule
        .last_execution()
}

fn recorded_recently(marker: &LastExecution) -> bool {
    match marker {
        LastExecution::At(at) => Utc::now() - *at < Duration::minutes(1),
        _ => false,
    }
}

#[tokio::test]
async fn first_cycle_runs_when_never_executed() {
    let harness = harness(None, SchedulerOptions::default());
    harness.records.seed_at_offsets(&[Duration::hours(3)]).await;

    harness.scheduler.run_cycle().await;

    assert_eq!(harness.records.count().await.ok(), Some(0));
    assert!(recorded_recently(&stored_marker(&harness.documents).await));
}

#[tokio::test]
async fn cycle_skips_before_interval_elapses() {
    let harness = harness(Some(23), SchedulerOptions::default());
    harness.records.seed_at_offsets(&[Duration::hours(3)]).await;
    let before = stored_marker(&harness.documents).await;

    harness.scheduler.run_cycle().await;

    assert_eq!(harness.records.count().await.ok(), Some(1));
    assert_eq!(stored_marker(&harness.documents).await, before);
}

#[tokio::test]
async fn cycle_runs_after_interval_and_records_time() {
    let harness = harness(Some(25), SchedulerOptions::default());
    harness.records.seed_at_offsets(&[Duration::hours(3)]).await;

    harness.scheduler.run_cycle().await;

    assert_eq!(harness.records.count().await.ok(), Some(0));
    assert!(recorded_recently(&stored_marker(&harness.documents).await));
}

#[tokio::test]
async fn unreadable_marker_runs_and_is_replaced() {
    let harness = harness(None, SchedulerOptions::default());
    if let Some(config) = harness.documents.document.lock().await.as_mut() {
        config.schedule.last_execution = Some("last tuesday".to_owned());
    }
    harness.records.seed_at_offsets(&[Duration::hours(3)]).await;

    harness.scheduler.run_cycle().await;

    assert_eq!(harness.records.count().await.ok(), Some(0));
    assert!(recorded_recently(&stored_marker(&harness.documents).await));
}

#[tokio::test]
async fn degraded_pass_advances_marker_by_default() {
    let harness = harness(None, SchedulerOptions::default());
    harness.records.seed_at_offsets(&[Duration::hours(3)]).await;
    harness.archiver.fail.store(true, Ordering::SeqCst);

    let result = harness.scheduler.run_pass().await;
    assert!(result.is_ok());
    let result = result.unwrap_or_else(|_| unreachable!());

    assert!(result.is_degraded());
    assert!(recorded_recently(&stored_marker(&harness.documents).await));
}

#[tokio::test]
async fn degraded_pass_keeps_marker_when_advance_disabled() {
    let options = SchedulerOptions {
        advance_on_failure: false,
        ..SchedulerOptions::default()
    };
    let harness = harness(None, options);
    harness.records.seed_at_offsets(&[Duration::hours(3)]).await;
    harness.archiver.fail.store(true, Ordering::SeqCst);

    let result = harness.scheduler.run_pass().await;

    assert!(result.is_ok());
    assert_eq!(
        stored_marker(&harness.documents).await,
        LastExecution::Never
    );
}

#[tokio::test]
async fn startup_pass_ignores_interval_and_records_time() {
    let harness = harness(Some(1), SchedulerOptions::default());
    harness.records.seed_at_offsets(&[Duration::hours(3)]).await;

    let result = harness.scheduler.run_startup_pass().await;
    assert!(result.is_ok());
    let result = result.unwrap_or_else(|_| unreachable!());

    assert_eq!(result.records_deleted, 1);
    match stored_marker(&harness.documents).await {
        LastExecution::At(at) => assert!(Utc::now() - at < Duration::minutes(1)),
        other => panic!("unexpected marker {other:?}"),
    }
}

#[tokio::test]
async fn start_twice_conflicts_and_stop_returns_to_stopped() {
    let harness = harness(Some(1), SchedulerOptions::default());

    assert_eq!(harness.scheduler.state().await, SchedulerState::Stopped);
    assert!(harness.scheduler.start().await.is_ok());
    assert_eq!(harness.scheduler.state().await, SchedulerState::Running);
    assert!(matches!(
        harness.scheduler.start().await,
        Err(AppError::Conflict(_))
    ));

    harness.scheduler.stop().await;
    assert_eq!(harness.scheduler.state().await, SchedulerState::Stopped);

    assert!(harness.scheduler.start().await.is_ok());
    harness.scheduler.stop().await;
    assert_eq!(harness.scheduler.state().await, SchedulerState::Stopped);
}

#[tokio::test]
async fn stop_interrupts_sleep_promptly() {
    let harness = harness(None, SchedulerOptions::default());
    assert!(harness.scheduler.start().await.is_ok());

    // Wait for the first cycle to record its pass, leaving the worker asleep
    // for the full hour-long wake interval.
    for _ in 0..200 {
        if recorded_recently(&stored_marker(&harness.documents).await) {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    assert!(recorded_recently(&stored_marker(&harness.documents).await));

    let started = Instant::now();
    harness.scheduler.stop().await;

    assert!(started.elapsed() < StdDuration::from_secs(2));
    assert_eq!(harness.scheduler.state().await, SchedulerState::Stopped);
}

#[tokio::test]
async fn stop_on_stopped_scheduler_is_noop() {
    let harness = harness(None, SchedulerOptions::default());
    harness.scheduler.stop().await;
    assert_eq!(harness.scheduler.state().await, SchedulerState::Stopped);
}

#[tokio::test]
async fn slow_worker_stays_stopping_until_it_exits() {
    let options = SchedulerOptions {
        stop_timeout: StdDuration::from_millis(20),
        ..SchedulerOptions::default()
    };
    let harness = harness(Some(1), options);
    harness.documents.load_delay_ms.store(300, Ordering::SeqCst);
    assert!(harness.scheduler.start().await.is_ok());
    tokio::time::sleep(StdDuration::from_millis(20)).await;

    harness.scheduler.stop().await;

    assert_eq!(harness.scheduler.state().await, SchedulerState::Stopping);
    assert!(matches!(
        harness.scheduler.start().await,
        Err(AppError::Conflict(_))
    ));

    let mut settled = false;
    for _ in 0..100 {
        if harness.scheduler.state().await == SchedulerState::Stopped {
            settled = true;
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    assert!(settled);
    harness.documents.load_delay_ms.store(0, Ordering::SeqCst);
    assert!(harness.scheduler.start().await.is_ok());
    harness.scheduler.stop().await;
}
