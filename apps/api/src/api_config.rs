use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use logtrail_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE_URL: &str = "sqlite://logtrail.db?mode=rwc";
const DEFAULT_RETENTION_CONFIG_PATH: &str = "retention_config.yml";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub retention_config_path: String,
    pub api_host: String,
    pub api_port: u16,
    pub udp_host: String,
    pub udp_port: Option<u16>,
    pub wake_interval: Duration,
    pub advance_on_failure: bool,
    pub scheduler_enabled: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        let retention_config_path = env::var("RETENTION_CONFIG_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RETENTION_CONFIG_PATH.to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_port("API_PORT", env::var("API_PORT").ok())?.unwrap_or(5000);
        let udp_host = env::var("UDP_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
        let udp_port = parse_port("UDP_PORT", env::var("UDP_PORT").ok())?;

        let wake_interval_seconds = match optional_env("RETENTION_WAKE_INTERVAL_SECONDS") {
            None => 3600,
            Some(value) => value.parse::<u64>().ok().filter(|seconds| *seconds > 0).ok_or_else(
                || {
                    AppError::Validation(format!(
                        "RETENTION_WAKE_INTERVAL_SECONDS must be a positive integer, got '{value}'"
                    ))
                },
            )?,
        };

        let advance_on_failure = parse_flag(
            "RETENTION_ADVANCE_ON_FAILURE",
            optional_env("RETENTION_ADVANCE_ON_FAILURE"),
        )?
        .unwrap_or(true);
        let scheduler_enabled = parse_flag(
            "RETENTION_SCHEDULER_ENABLED",
            optional_env("RETENTION_SCHEDULER_ENABLED"),
        )?
        .unwrap_or(true);

        Ok(Self {
            database_url,
            retention_config_path,
            api_host,
            api_port,
            udp_host,
            udp_port,
            wake_interval: Duration::from_secs(wake_interval_seconds),
            advance_on_failure,
            scheduler_enabled,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    /// Returns the datagram listener address, or `None` when UDP ingestion is off.
    pub fn udp_address(&self) -> Result<Option<SocketAddr>, AppError> {
        let Some(port) = self.udp_port else {
            return Ok(None);
        };

        let host = IpAddr::from_str(&self.udp_host).map_err(|error| {
            AppError::Validation(format!("invalid UDP_HOST '{}': {error}", self.udp_host))
        })?;
        Ok(Some(SocketAddr::from((host, port))))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_port(name: &str, value: Option<String>) -> Result<Option<u16>, AppError> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    value
        .trim()
        .parse::<u16>()
        .map(Some)
        .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
}

fn parse_flag(name: &str, value: Option<String>) -> Result<Option<bool>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(AppError::Validation(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}
