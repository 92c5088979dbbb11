use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logtrail_application::RetentionInfo;
use logtrail_core::AppError;
use logtrail_domain::{RetentionConfigUpdate, RetentionDuration};
use tracing::info;

use crate::dto::{
    CleanupRequest, CleanupResponse, DurationValidationFailure, DurationValidationRequest,
    DurationValidationResponse, RetentionSettingsResponse, UpdateRetentionSettingsRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn retention_settings_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<RetentionInfo>> {
    let info = state.retention_service.retention_info().await?;
    Ok(Json(info))
}

/// Applies a partial update; sections and keys left out keep their values.
pub async fn update_retention_settings_handler(
    State(state): State<AppState>,
    Json(payload): Json<UpdateRetentionSettingsRequest>,
) -> ApiResult<Json<RetentionSettingsResponse>> {
    let update = RetentionConfigUpdate::from(payload);
    if update.is_empty() {
        return Err(AppError::Validation("no settings provided".to_owned()).into());
    }

    state.retention_service.policy().update(update).await?;
    info!("retention settings updated");

    let settings = state.retention_service.retention_info().await?;
    Ok(Json(RetentionSettingsResponse {
        message: "Retention settings updated successfully",
        settings,
    }))
}

pub async fn cleanup_handler(
    State(state): State<AppState>,
    payload: Option<Json<CleanupRequest>>,
) -> ApiResult<Json<CleanupResponse>> {
    let dry_run = payload.map(|Json(request)| request.dry_run).unwrap_or_default();
    let result = state.retention_service.cleanup(dry_run).await?;

    Ok(Json(CleanupResponse {
        message: if dry_run {
            "Dry run completed"
        } else {
            "Cleanup completed"
        },
        result,
    }))
}

pub async fn preview_handler(State(state): State<AppState>) -> ApiResult<Json<CleanupResponse>> {
    let result = state.retention_service.preview().await?;

    Ok(Json(CleanupResponse {
        message: "Preview completed",
        result,
    }))
}

pub async fn validate_duration_handler(
    Json(payload): Json<DurationValidationRequest>,
) -> ApiResult<Response> {
    let Some(duration) = payload.duration else {
        return Err(AppError::Validation("duration string required".to_owned()).into());
    };

    let response = match RetentionDuration::parse(duration.as_str()) {
        Ok(parsed) => Json(DurationValidationResponse {
            valid: true,
            canonical: parsed.to_string(),
            seconds: parsed.as_seconds(),
            human_readable: parsed.human_readable(),
            duration,
        })
        .into_response(),
        Err(error) => (
            StatusCode::BAD_REQUEST,
            Json(DurationValidationFailure {
                valid: false,
                error: error.to_string(),
            }),
        )
            .into_response(),
    };

    Ok(response)
}

#[cfg(test)]
mod tests;
