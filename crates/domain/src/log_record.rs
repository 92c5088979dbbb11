use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use logtrail_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a stored log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Routine operation.
    Info,
    /// Something unexpected that did not fail.
    Warning,
    /// A failed operation.
    Error,
    /// A failure the emitting program may not survive.
    Critical,
}

impl LogLevel {
    /// Returns the stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Returns all known levels, least severe first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[LogLevel] = &[
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ];

        ALL
    }
}

impl FromStr for LogLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown log level '{value}'"
            ))),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Store-assigned record identifier, unique and monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecordId(i64);

impl LogRecordId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for LogRecordId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A persisted log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Store-assigned identifier.
    pub id: LogRecordId,
    /// Event time in fractional seconds since the Unix epoch.
    pub timestamp: f64,
    /// Emitting logger name.
    pub name: String,
    /// Severity.
    pub level: LogLevel,
    /// Rendered message text.
    pub message: String,
    /// Source file path reported by the emitter.
    pub pathname: Option<String>,
    /// Source line number reported by the emitter.
    pub lineno: Option<i64>,
    /// Function name reported by the emitter.
    pub function: Option<String>,
    /// Positional message arguments.
    pub args: Option<Value>,
    /// Formatted exception text.
    pub exc_info: Option<String>,
    /// Free-form metadata attached at ingestion.
    pub metadata: Option<Value>,
}

impl LogRecord {
    /// Returns the event time as a UTC datetime when representable.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        timestamp_to_datetime(self.timestamp)
    }
}

/// Converts fractional epoch seconds into a UTC datetime.
#[must_use]
pub fn timestamp_to_datetime(timestamp: f64) -> Option<DateTime<Utc>> {
    if !timestamp.is_finite() {
        return None;
    }

    let micros = (timestamp * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }

    DateTime::<Utc>::from_timestamp_micros(micros as i64)
}

/// Converts a UTC datetime into fractional epoch seconds.
#[must_use]
pub fn datetime_to_timestamp(datetime: DateTime<Utc>) -> f64 {
    datetime.timestamp_micros() as f64 / 1_000_000.0
}

/// A validated log event that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogRecord {
    timestamp: f64,
    name: NonEmptyString,
    level: LogLevel,
    message: String,
    pathname: Option<String>,
    lineno: Option<i64>,
    function: Option<String>,
    args: Option<Value>,
    exc_info: Option<String>,
    metadata: Option<Value>,
}

impl NewLogRecord {
    /// Creates a validated record with no source location or metadata.
    pub fn new(
        timestamp: f64,
        name: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> AppResult<Self> {
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(AppError::Validation(format!(
                "timestamp must be a non-negative number of seconds, got {timestamp}"
            )));
        }

        Ok(Self {
            timestamp,
            name: NonEmptyString::new(name)?,
            level,
            message: message.into(),
            pathname: None,
            lineno: None,
            function: None,
            args: None,
            exc_info: None,
            metadata: None,
        })
    }

    /// Attaches the emitter's source location.
    #[must_use]
    pub fn with_source(
        mut self,
        pathname: Option<String>,
        lineno: Option<i64>,
        function: Option<String>,
    ) -> Self {
        self.pathname = pathname;
        self.lineno = lineno;
        self.function = function;
        self
    }

    /// Attaches positional message arguments.
    #[must_use]
    pub fn with_args(mut self, args: Option<Value>) -> Self {
        self.args = args;
        self
    }

    /// Attaches formatted exception text.
    #[must_use]
    pub fn with_exc_info(mut self, exc_info: Option<String>) -> Self {
        self.exc_info = exc_info;
        self
    }

    /// Attaches free-form metadata. Empty objects are stored as absent.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<Value>) -> Self {
        self.metadata = metadata.filter(|value| match value {
            Value::Object(map) => !map.is_empty(),
            Value::Null => false,
            _ => true,
        });
        self
    }

    /// Returns the event time in epoch seconds.
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Returns the logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the severity.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the source file path.
    #[must_use]
    pub fn pathname(&self) -> Option<&str> {
        self.pathname.as_deref()
    }

    /// Returns the source line number.
    #[must_use]
    pub fn lineno(&self) -> Option<i64> {
        self.lineno
    }

    /// Returns the function name.
    #[must_use]
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Returns message arguments.
    #[must_use]
    pub fn args(&self) -> Option<&Value> {
        self.args.as_ref()
    }

    /// Returns formatted exception text.
    #[must_use]
    pub fn exc_info(&self) -> Option<&str> {
        self.exc_info.as_deref()
    }

    /// Returns attached metadata.
    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// Converts into a stored record with the identifier the store assigned.
    #[must_use]
    pub fn into_record(self, id: LogRecordId) -> LogRecord {
        LogRecord {
            id,
            timestamp: self.timestamp,
            name: self.name.into(),
            level: self.level,
            message: self.message,
            pathname: self.pathname,
            lineno: self.lineno,
            function: self.function,
            args: self.args,
            exc_info: self.exc_info,
            metadata: self.metadata,
        }
    }
}
