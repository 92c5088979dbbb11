use std::str::FromStr;

use serde_json::Value;
use sqlx::FromRow;

use logtrail_core::{AppError, AppResult};
use logtrail_domain::{LogLevel, LogRecord, LogRecordId};

pub(super) const LOG_ENTRY_COLUMNS: &str =
    "id, timestamp, name, level, pathname, lineno, msg, args, exc_info, func, extra_metadata";

#[derive(Debug, FromRow)]
pub(super) struct LogEntryRow {
    id: i64,
    timestamp: f64,
    name: String,
    level: String,
    pathname: Option<String>,
    lineno: Option<i64>,
    msg: String,
    args: Option<String>,
    exc_info: Option<String>,
    func: Option<String>,
    extra_metadata: Option<String>,
}

impl TryFrom<LogEntryRow> for LogRecord {
    type Error = AppError;

    fn try_from(row: LogEntryRow) -> Result<Self, Self::Error> {
        let level = LogLevel::from_str(row.level.as_str()).map_err(|error| {
            AppError::Internal(format!("log record {} has invalid level: {error}", row.id))
        })?;

        Ok(Self {
            id: LogRecordId::new(row.id),
            timestamp: row.timestamp,
            name: row.name,
            level,
            message: row.msg,
            pathname: row.pathname,
            lineno: row.lineno,
            function: row.func,
            args: decode_json(row.args, row.id, "args")?,
            exc_info: row.exc_info,
            metadata: decode_json(row.extra_metadata, row.id, "extra_metadata")?,
        })
    }
}

pub(super) fn encode_json(value: Option<&Value>, column: &str) -> AppResult<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(|error| AppError::Internal(format!("failed to encode {column}: {error}")))
}

fn decode_json(raw: Option<String>, id: i64, column: &str) -> AppResult<Option<Value>> {
    raw.map(|raw| serde_json::from_str(raw.as_str()))
        .transpose()
        .map_err(|error| {
            AppError::Internal(format!("log record {id} has invalid {column}: {error}"))
        })
}
