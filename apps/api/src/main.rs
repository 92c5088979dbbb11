//! logtrail API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod state;
mod udp_ingest;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use logtrail_core::AppError;
use logtrail_infrastructure::SqliteLogRecordRepository;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, build_scheduler, connect_and_migrate};
use crate::udp_ingest::UdpLogListener;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;
    let shutdown = CancellationToken::new();
    let app_state = build_app_state(
        Arc::new(SqliteLogRecordRepository::new(pool)),
        &config.retention_config_path,
        shutdown.clone(),
    );

    let policy = app_state.retention_service.policy().load().await?;
    info!(
        path = %config.retention_config_path,
        time_based = policy.time_based.enabled,
        count_based = policy.count_based.enabled,
        "retention policy loaded"
    );

    let scheduler = build_scheduler(&app_state, &config);
    if policy.schedule.on_startup {
        match scheduler.run_startup_pass().await {
            Ok(result) => info!(
                records_deleted = result.records_deleted,
                export_file = ?result.export_file,
                "startup retention pass finished"
            ),
            Err(error) => warn!(error = %error, "startup retention pass failed"),
        }
    }
    if config.scheduler_enabled {
        scheduler.start().await?;
    }

    let udp_task = match config.udp_address()? {
        Some(address) => {
            let listener = UdpLogListener::bind(address, app_state.ingest_service.clone()).await?;
            Some(tokio::spawn(listener.run(shutdown.clone())))
        }
        None => None,
    };

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, "logtrail api listening");

    let served = axum::serve(listener, build_router(app_state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .map_err(|error| AppError::Internal(format!("API server failed: {error}")));

    shutdown.cancel();
    scheduler.stop().await;
    if let Some(task) = udp_task {
        if let Err(join_error) = task.await {
            error!(error = %join_error, "UDP listener ended abnormally");
        }
    }
    info!("logtrail api stopped");

    served
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(error) = signal {
                error!(error = %error, "failed to listen for shutdown signal");
                shutdown.cancelled().await;
                return;
            }
            info!("shutdown signal received");
        }
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
}
