use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = match state.ingest_service.record_count().await {
        Ok(records) => HealthDependencyStatus {
            status: "ok",
            records: Some(records),
            detail: None,
        },
        Err(error) => HealthDependencyStatus {
            status: "error",
            records: None,
            detail: Some(format!("record store check failed: {error}")),
        },
    };

    let ready = store.status == "ok";
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if ready { "ok" } else { "degraded" },
            store,
        }),
    )
}
