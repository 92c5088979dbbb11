use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use logtrail_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::duration::RetentionDuration;

/// Default time-based retention window.
pub const DEFAULT_RETENTION_DURATION: &str = "7d";

/// Default count-based ceiling.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Default archive output directory.
pub const DEFAULT_EXPORT_DIRECTORY: &str = "exports";

/// Default hours between scheduled passes.
pub const DEFAULT_INTERVAL_HOURS: u32 = 24;

/// Retention policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Age-based rule.
    pub time_based: TimeBasedRetention,
    /// Size-based rule.
    pub count_based: CountBasedRetention,
    /// Archive written before deletion.
    pub export: ExportSettings,
    /// Background pass cadence.
    pub schedule: RetentionSchedule,
}

impl RetentionConfig {
    /// Checks cross-field invariants before the document is persisted.
    pub fn validate(&self) -> AppResult<()> {
        if self.time_based.enabled {
            RetentionDuration::parse(self.time_based.duration.as_str()).map_err(|error| {
                AppError::ConfigInvalid(format!("time_based.duration: {error}"))
            })?;
        }

        if self.count_based.enabled && self.count_based.max_entries == 0 {
            return Err(AppError::ConfigInvalid(
                "count_based.max_entries must be a positive integer".to_owned(),
            ));
        }

        if self.export.enabled && self.export.output_directory.trim().is_empty() {
            return Err(AppError::ConfigInvalid(
                "export.output_directory must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Deletes records older than a rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBasedRetention {
    /// Whether the rule participates in cleanup.
    pub enabled: bool,
    /// Window in duration grammar, e.g. `"7d"`.
    pub duration: String,
}

impl Default for TimeBasedRetention {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: DEFAULT_RETENTION_DURATION.to_owned(),
        }
    }
}

/// Keeps at most `max_entries` of the newest records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountBasedRetention {
    /// Whether the rule participates in cleanup.
    pub enabled: bool,
    /// Ceiling on retained records.
    pub max_entries: u64,
}

impl Default for CountBasedRetention {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Archive file layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// A ZIP archive holding one CSV file.
    #[default]
    CsvZip,
    /// A gzip-compressed CSV file.
    CsvGzip,
}

impl ExportFormat {
    /// Returns the stable document value for this format.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CsvZip => "csv_zip",
            Self::CsvGzip => "csv_gzip",
        }
    }

    /// Returns the archive file extension without a leading dot.
    #[must_use]
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::CsvZip => "zip",
            Self::CsvGzip => "csv.gz",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "csv_zip" => Ok(Self::CsvZip),
            "csv_gzip" => Ok(Self::CsvGzip),
            _ => Err(AppError::ConfigInvalid(format!(
                "unknown export format '{value}', expected csv_zip or csv_gzip"
            ))),
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Archive settings applied before deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Whether doomed records are archived.
    pub enabled: bool,
    /// Archive layout.
    pub format: ExportFormat,
    /// Directory the archive is written to.
    pub output_directory: String,
    /// Whether the file name carries a `_YYYYMMDD_HHMMSS` suffix.
    pub include_timestamp: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            format: ExportFormat::CsvZip,
            output_directory: DEFAULT_EXPORT_DIRECTORY.to_owned(),
            include_timestamp: true,
        }
    }
}

/// Background pass cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSchedule {
    /// Whether a pass runs once at process start.
    pub on_startup: bool,
    /// Minimum hours between scheduled passes.
    pub interval_hours: u32,
    /// RFC 3339 UTC time of the last attempted pass.
    pub last_execution: Option<String>,
}

impl Default for RetentionSchedule {
    fn default() -> Self {
        Self {
            on_startup: true,
            interval_hours: DEFAULT_INTERVAL_HOURS,
            last_execution: None,
        }
    }
}

/// Interpretation of the stored last-execution marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastExecution {
    /// No pass has been recorded.
    Never,
    /// The last pass started at this time.
    At(DateTime<Utc>),
    /// The marker is present but not a readable timestamp.
    Unreadable(String),
}

impl RetentionSchedule {
    /// Parses the stored last-execution marker.
    ///
    /// RFC 3339 values are read with their offset; ISO 8601 values without
    /// an offset are taken as UTC.
    #[must_use]
    pub fn last_execution(&self) -> LastExecution {
        match self.last_execution.as_deref().map(str::trim) {
            None | Some("") => LastExecution::Never,
            Some(raw) => parse_execution_time(raw)
                .map(LastExecution::At)
                .unwrap_or_else(|| LastExecution::Unreadable(raw.to_owned())),
        }
    }

    /// Records a pass at the given time.
    pub fn record_execution(&mut self, at: DateTime<Utc>) {
        self.last_execution = Some(format_execution_time(at));
    }
}

fn parse_execution_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

/// Formats a pass time the way it is stored in the policy document.
#[must_use]
pub fn format_execution_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Partial update of a retention policy, section by section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionConfigUpdate {
    /// Age-based rule changes.
    pub time_based: Option<TimeBasedRetentionUpdate>,
    /// Size-based rule changes.
    pub count_based: Option<CountBasedRetentionUpdate>,
    /// Archive changes.
    pub export: Option<ExportSettingsUpdate>,
    /// Cadence changes.
    pub schedule: Option<RetentionScheduleUpdate>,
}

/// Age-based rule changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBasedRetentionUpdate {
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New window in duration grammar.
    pub duration: Option<String>,
}

/// Size-based rule changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountBasedRetentionUpdate {
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New ceiling; signed so that negative input is reported instead of wrapping.
    pub max_entries: Option<i64>,
}

/// Archive changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSettingsUpdate {
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New format tag.
    pub format: Option<String>,
    /// New output directory.
    pub output_directory: Option<String>,
    /// New file-name timestamp flag.
    pub include_timestamp: Option<bool>,
}

/// Cadence changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionScheduleUpdate {
    /// New startup flag.
    pub on_startup: Option<bool>,
    /// New interval; signed so that negative input is reported instead of wrapping.
    pub interval_hours: Option<i64>,
}

impl RetentionConfigUpdate {
    /// Returns true when no section carries a change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time_based.is_none()
            && self.count_based.is_none()
            && self.export.is_none()
            && self.schedule.is_none()
    }

    /// Applies the changes to a copy of `current` and validates the result.
    ///
    /// A provided duration is checked even when the rule stays disabled, so a
    /// bad value is reported at the time it is entered.
    pub fn apply(&self, current: &RetentionConfig) -> AppResult<RetentionConfig> {
        let mut next = current.clone();

        if let Some(time_based) = &self.time_based {
            if let Some(duration) = &time_based.duration {
                let parsed = RetentionDuration::parse(duration)?;
                next.time_based.duration = parsed.to_string();
            }
            if let Some(enabled) = time_based.enabled {
                next.time_based.enabled = enabled;
            }
        }

        if let Some(count_based) = &self.count_based {
            if let Some(max_entries) = count_based.max_entries {
                next.count_based.max_entries = u64::try_from(max_entries)
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or_else(|| {
                        AppError::ConfigInvalid(format!(
                            "count_based.max_entries must be a positive integer, got {max_entries}"
                        ))
                    })?;
            }
            if let Some(enabled) = count_based.enabled {
                next.count_based.enabled = enabled;
            }
        }

        if let Some(export) = &self.export {
            if let Some(format) = &export.format {
                next.export.format = ExportFormat::from_str(format.trim())?;
            }
            if let Some(output_directory) = &export.output_directory {
                next.export.output_directory = output_directory.trim().to_owned();
            }
            if let Some(enabled) = export.enabled {
                next.export.enabled = enabled;
            }
            if let Some(include_timestamp) = export.include_timestamp {
                next.export.include_timestamp = include_timestamp;
            }
        }

        if let Some(schedule) = &self.schedule {
            if let Some(interval_hours) = schedule.interval_hours {
                next.schedule.interval_hours =
                    u32::try_from(interval_hours).map_err(|_| {
                        AppError::ConfigInvalid(format!(
                            "schedule.interval_hours must be between 0 and {}, got {interval_hours}",
                            u32::MAX
                        ))
                    })?;
            }
            if let Some(on_startup) = schedule.on_startup {
                next.schedule.on_startup = on_startup;
            }
        }

        next.validate()?;
        Ok(next)
    }
}
