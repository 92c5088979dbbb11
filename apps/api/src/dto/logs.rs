use std::str::FromStr;

use chrono::SecondsFormat;
use logtrail_application::{DEFAULT_RECENT_LIMIT, LogRecordQuery};
use logtrail_core::AppError;
use logtrail_domain::{LogLevel, LogRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Acknowledgement for an accepted log event.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub id: i64,
}

/// Filters accepted by the recent-logs listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQueryParams {
    pub level: Option<String>,
    pub name: Option<String>,
    pub since: Option<f64>,
    pub limit: Option<usize>,
}

impl TryFrom<LogQueryParams> for LogRecordQuery {
    type Error = AppError;

    fn try_from(value: LogQueryParams) -> Result<Self, Self::Error> {
        let level = value
            .level
            .as_deref()
            .filter(|level| !level.trim().is_empty())
            .map(LogLevel::from_str)
            .transpose()?;

        let limit = value.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        if limit == 0 {
            return Err(AppError::Validation("limit must be greater than 0".to_owned()));
        }

        Ok(Self {
            level,
            name: value.name.filter(|name| !name.trim().is_empty()),
            since: value.since,
            limit,
        })
    }
}

/// Viewer representation of a stored record.
///
/// Metadata keys are flattened next to the record fields.
#[derive(Debug, Serialize)]
pub struct LogRecordResponse {
    pub id: i64,
    pub timestamp: String,
    pub created: f64,
    pub level: &'static str,
    pub name: String,
    pub msg: String,
    pub pathname: Option<String>,
    pub lineno: Option<i64>,
    pub func: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exc_info: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl From<LogRecord> for LogRecordResponse {
    fn from(value: LogRecord) -> Self {
        let timestamp = value
            .datetime()
            .map(|datetime| datetime.to_rfc3339_opts(SecondsFormat::Micros, true))
            .unwrap_or_default();
        let metadata = match value.metadata {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Self {
            id: value.id.as_i64(),
            timestamp,
            created: value.timestamp,
            level: value.level.as_str(),
            name: value.name,
            msg: value.message,
            pathname: value.pathname,
            lineno: value.lineno,
            func: value.function,
            exc_info: value.exc_info,
            metadata,
        }
    }
}
