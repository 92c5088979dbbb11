//! Conversion of Python `logging` record fields into validated records.
//!
//! Emitters send the attribute names of a `logging.LogRecord` (`created`,
//! `msecs`, `levelname`, `msg`, ...). Keys that are not record fields become
//! free-form metadata.

use std::str::FromStr;

use serde_json::{Map, Value};

use logtrail_core::{AppError, AppResult};
use logtrail_domain::{LogLevel, NewLogRecord};

const RECORD_FIELDS: &[&str] = &[
    "created",
    "msecs",
    "levelname",
    "msg",
    "name",
    "pathname",
    "lineno",
    "args",
    "exc_info",
    "funcName",
    "func",
];

// Attributes a datagram emitter serializes that carry no information worth
// keeping as metadata.
const DATAGRAM_NOISE_FIELDS: &[&str] = &[
    "levelno",
    "filename",
    "module",
    "relativeCreated",
    "thread",
    "threadName",
    "processName",
    "process",
    "exc_text",
    "stack_info",
    "taskName",
];

/// Where a log event arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEventSource {
    /// `POST /log`; unknown levels are rejected.
    Http,
    /// UDP datagram; unknown levels fall back to INFO.
    Datagram,
}

impl LogEventSource {
    fn is_metadata_key(&self, key: &str) -> bool {
        if RECORD_FIELDS.contains(&key) {
            return false;
        }

        match self {
            Self::Http => true,
            Self::Datagram => !key.starts_with('_') && !DATAGRAM_NOISE_FIELDS.contains(&key),
        }
    }
}

/// Builds a record from emitter fields.
///
/// `extra_metadata` is merged over metadata taken from `fields`, so its keys
/// win. `now` is used when the event carries no `created` time.
pub fn parse_log_event(
    source: LogEventSource,
    fields: Map<String, Value>,
    extra_metadata: Map<String, Value>,
    now: f64,
) -> AppResult<NewLogRecord> {
    let created = optional_number(&fields, "created")?;
    let msecs = optional_number(&fields, "msecs")?;
    let timestamp = match (created, msecs) {
        (Some(created), Some(msecs)) => created + msecs / 1000.0,
        (Some(created), None) => created,
        (None, _) => now,
    };

    let level = match fields.get("levelname").and_then(Value::as_str) {
        None => LogLevel::Info,
        Some(raw) => match (LogLevel::from_str(raw), source) {
            (Ok(level), _) => level,
            (Err(_), LogEventSource::Datagram) => LogLevel::Info,
            (Err(error), LogEventSource::Http) => return Err(error),
        },
    };

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or("root")
        .to_owned();
    let message = fields.get("msg").map(text_of).unwrap_or_default();
    let pathname = fields.get("pathname").and_then(non_null).map(text_of);
    let lineno = optional_integer(&fields, "lineno")?;
    let function = fields
        .get("funcName")
        .or_else(|| fields.get("func"))
        .and_then(non_null)
        .map(text_of);
    let args = fields.get("args").and_then(non_null).cloned();
    let exc_info = fields.get("exc_info").and_then(non_null).map(text_of);

    let mut metadata: Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| source.is_metadata_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    metadata.extend(extra_metadata);

    Ok(NewLogRecord::new(timestamp, name, level, message)?
        .with_source(pathname, lineno, function)
        .with_args(args)
        .with_exc_info(exc_info)
        .with_metadata(Some(Value::Object(metadata))))
}

fn non_null(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn optional_number(fields: &Map<String, Value>, key: &str) -> AppResult<Option<f64>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(text)) => text.trim().parse::<f64>().map(Some).map_err(|_| {
            AppError::Validation(format!("field '{key}' must be a number, got '{text}'"))
        }),
        Some(other) => Err(AppError::Validation(format!(
            "field '{key}' must be a number, got {other}"
        ))),
    }
}

fn optional_integer(fields: &Map<String, Value>, key: &str) -> AppResult<Option<i64>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_i64()),
        Some(Value::String(text)) => text.trim().parse::<i64>().map(Some).map_err(|_| {
            AppError::Validation(format!("field '{key}' must be an integer, got '{text}'"))
        }),
        Some(other) => Err(AppError::Validation(format!(
            "field '{key}' must be an integer, got {other}"
        ))),
    }
}
