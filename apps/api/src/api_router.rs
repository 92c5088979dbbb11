use axum::Router;
use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let retention_routes = Router::new()
        .route(
            "/settings",
            get(handlers::retention::retention_settings_handler)
                .put(handlers::retention::update_retention_settings_handler),
        )
        .route("/cleanup", post(handlers::retention::cleanup_handler))
        .route("/preview", get(handlers::retention::preview_handler))
        .route(
            "/validate-duration",
            post(handlers::retention::validate_duration_handler),
        );

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/log", post(handlers::logs::ingest_log_handler))
        .route("/api/logs", get(handlers::logs::list_logs_handler))
        .route("/api/logs/stream", get(handlers::logs::stream_logs_handler))
        .nest("/api/retention", retention_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state)
}
