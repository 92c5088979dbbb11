use axum::Json;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use logtrail_core::AppError;
use logtrail_domain::datetime_to_timestamp;
use serde_json::{Value, json};

use super::{
    cleanup_handler, preview_handler, retention_settings_handler,
    update_retention_settings_handler, validate_duration_handler,
};
use crate::dto::{CleanupRequest, DurationValidationRequest, UpdateRetentionSettingsRequest};
use crate::error::ApiError;
use crate::test_support::TestApp;

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await;
    assert!(bytes.is_ok());
    let bytes = bytes.unwrap_or_default();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn update_request(body: Value) -> UpdateRetentionSettingsRequest {
    match serde_json::from_value(body) {
        Ok(request) => request,
        Err(error) => panic!("invalid settings body: {error}"),
    }
}

async fn seed_two_expired_and_one_fresh(app: &TestApp) {
    app.seed(&[1.0, 2.0, datetime_to_timestamp(Utc::now())])
        .await;
}

#[tokio::test]
async fn settings_include_policy_and_statistics() {
    let app = TestApp::new().await;
    seed_two_expired_and_one_fresh(&app).await;

    let info = match retention_settings_handler(State(app.state.clone())).await {
        Ok(Json(info)) => info,
        Err(_) => panic!("expected settings"),
    };

    assert_eq!(info.config.time_based.duration, "7d");
    assert_eq!(info.statistics.total_records, 3);
    assert_eq!(info.statistics.time_based_candidates, 2);
    assert_eq!(info.statistics.total_candidates, 2);
}

#[tokio::test]
async fn partial_update_keeps_untouched_sections() {
    let app = TestApp::new().await;
    seed_two_expired_and_one_fresh(&app).await;

    let response = update_retention_settings_handler(
        State(app.state.clone()),
        Json(update_request(json!({
            "count_based": {"enabled": true, "max_entries": 2}
        }))),
    )
    .await;

    let settings = match response {
        Ok(Json(body)) => body.settings,
        Err(_) => panic!("expected updated settings"),
    };
    assert!(settings.config.count_based.enabled);
    assert_eq!(settings.config.count_based.max_entries, 2);
    assert_eq!(settings.config.time_based.duration, "7d");
    assert_eq!(settings.statistics.count_based_candidates, 1);
    assert_eq!(settings.statistics.total_candidates, 2);

    let reloaded = app.state.retention_service.policy().load().await;
    assert!(reloaded.is_ok());
    let reloaded = reloaded.unwrap_or_else(|_| unreachable!());
    assert_eq!(reloaded.count_based.max_entries, 2);
}

#[tokio::test]
async fn malformed_duration_is_rejected_without_saving() {
    let app = TestApp::new().await;

    let response = update_retention_settings_handler(
        State(app.state.clone()),
        Json(update_request(json!({"time_based": {"duration": "7dx"}}))),
    )
    .await;

    assert!(matches!(response, Err(ApiError(AppError::InvalidFormat(_)))));
    let reloaded = app.state.retention_service.policy().load().await;
    assert!(reloaded.is_ok());
    let reloaded = reloaded.unwrap_or_else(|_| unreachable!());
    assert_eq!(reloaded.time_based.duration, "7d");
}

#[tokio::test]
async fn zero_max_entries_is_rejected() {
    let app = TestApp::new().await;

    let response = update_retention_settings_handler(
        State(app.state.clone()),
        Json(update_request(json!({
            "count_based": {"enabled": true, "max_entries": 0}
        }))),
    )
    .await;

    assert!(matches!(response, Err(ApiError(AppError::ConfigInvalid(_)))));
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let app = TestApp::new().await;

    let response = update_retention_settings_handler(
        State(app.state.clone()),
        Json(update_request(json!({}))),
    )
    .await;

    assert!(matches!(response, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn dry_run_cleanup_leaves_store_and_exports_untouched() {
    let app = TestApp::new().await;
    seed_two_expired_and_one_fresh(&app).await;

    let response = cleanup_handler(
        State(app.state.clone()),
        Some(Json(CleanupRequest { dry_run: true })),
    )
    .await;

    match response {
        Ok(Json(body)) => {
            assert_eq!(body.message, "Dry run completed");
            assert!(body.result.dry_run);
            assert_eq!(body.result.records_deleted, 2);
            assert_eq!(body.result.export_file, None);
        }
        Err(_) => panic!("expected a dry run result"),
    }
    assert_eq!(app.state.ingest_service.record_count().await.ok(), Some(3));
    assert!(!app.export_directory().exists());
}

#[tokio::test]
async fn cleanup_without_body_deletes_and_exports() {
    let app = TestApp::new().await;
    seed_two_expired_and_one_fresh(&app).await;

    let response = cleanup_handler(State(app.state.clone()), None).await;

    let result = match response {
        Ok(Json(body)) => body.result,
        Err(_) => panic!("expected a cleanup result"),
    };
    assert!(!result.dry_run);
    assert_eq!(result.records_deleted, 2);
    assert_eq!(result.time_based_deletions, 2);
    let Some(export_file) = result.export_file else {
        panic!("cleanup should report an export file");
    };
    assert!(std::path::Path::new(&export_file).exists());
    assert_eq!(app.state.ingest_service.record_count().await.ok(), Some(1));
}

#[tokio::test]
async fn preview_reports_without_deleting() {
    let app = TestApp::new().await;
    seed_two_expired_and_one_fresh(&app).await;

    let response = preview_handler(State(app.state.clone())).await;

    match response {
        Ok(Json(body)) => {
            assert_eq!(body.message, "Preview completed");
            assert!(body.result.dry_run);
            assert_eq!(body.result.records_deleted, 2);
        }
        Err(_) => panic!("expected a preview result"),
    }
    assert_eq!(app.state.ingest_service.record_count().await.ok(), Some(3));
}

#[tokio::test]
async fn valid_duration_reports_breakdown() {
    let response = validate_duration_handler(Json(DurationValidationRequest {
        duration: Some("2d12h".to_owned()),
    }))
    .await;
    assert!(response.is_ok());
    let response = response.unwrap_or_else(|_| unreachable!());

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["seconds"], json!(216_000));
    assert_eq!(body["human_readable"], json!("2 days, 12 hours"));
}

#[tokio::test]
async fn invalid_duration_reports_structured_error() {
    let response = validate_duration_handler(Json(DurationValidationRequest {
        duration: Some("7dx".to_owned()),
    }))
    .await;
    assert!(response.is_ok());
    let response = response.unwrap_or_else(|_| unreachable!());

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["valid"], json!(false));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_duration_is_rejected() {
    let response = validate_duration_handler(Json(DurationValidationRequest::default())).await;

    assert!(matches!(response, Err(ApiError(AppError::Validation(_)))));
}
