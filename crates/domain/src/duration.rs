//! Compact retention duration grammar.
//!
//! A duration is an optional `<digits>d`, then an optional `<digits>h`, then an
//! optional `<digits>m`, with no separators (`"7d"`, `"2d12h"`, `"45m"`). The
//! whole input must be consumed: trailing or out-of-order components are
//! rejected instead of being silently ignored.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use logtrail_core::{AppError, AppResult};

/// Seconds in one day.
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: u64 = 60 * 60;

/// Seconds in one minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

const UNITS: [(char, u64); 3] = [
    ('d', SECONDS_PER_DAY),
    ('h', SECONDS_PER_HOUR),
    ('m', SECONDS_PER_MINUTE),
];

/// A validated, strictly positive retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RetentionDuration {
    seconds: u64,
}

impl RetentionDuration {
    /// Parses a duration string such as `"2d12h"`.
    pub fn parse(text: &str) -> AppResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidFormat(
                "duration must not be empty".to_owned(),
            ));
        }

        let mut remaining = trimmed;
        let mut total_seconds: u64 = 0;
        let mut matched_component = false;

        for (suffix, unit_seconds) in UNITS {
            let digit_count = remaining
                .bytes()
                .take_while(|byte| byte.is_ascii_digit())
                .count();
            if digit_count == 0 {
                continue;
            }

            let (digits, rest) = remaining.split_at(digit_count);
            let Some(rest) = rest.strip_prefix(suffix) else {
                continue;
            };

            let value = digits
                .parse::<u64>()
                .map_err(|_| out_of_range(text))?;
            let component = value
                .checked_mul(unit_seconds)
                .ok_or_else(|| out_of_range(text))?;
            total_seconds = total_seconds
                .checked_add(component)
                .ok_or_else(|| out_of_range(text))?;

            matched_component = true;
            remaining = rest;
        }

        if !matched_component {
            return Err(AppError::InvalidFormat(format!(
                "'{text}' must use <n>d, <n>h and <n>m components (e.g. 7d, 2d12h, 45m)"
            )));
        }

        if !remaining.is_empty() {
            return Err(AppError::InvalidFormat(format!(
                "unexpected trailing characters '{remaining}' in '{text}'"
            )));
        }

        if total_seconds == 0 {
            return Err(AppError::InvalidFormat(format!(
                "duration must be greater than 0: '{text}'"
            )));
        }

        Ok(Self {
            seconds: total_seconds,
        })
    }

    /// Returns the window length in seconds.
    #[must_use]
    pub fn as_seconds(&self) -> u64 {
        self.seconds
    }

    /// Returns the window as a standard library duration.
    #[must_use]
    pub fn as_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.seconds)
    }

    /// Returns a breakdown such as `"2 days, 12 hours"`.
    #[must_use]
    pub fn human_readable(&self) -> String {
        describe_duration(self.seconds)
    }
}

impl FromStr for RetentionDuration {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for RetentionDuration {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(render_duration(self.seconds).as_str())
    }
}

/// Parses a duration string into seconds.
pub fn parse_duration_seconds(text: &str) -> AppResult<u64> {
    RetentionDuration::parse(text).map(|duration| duration.as_seconds())
}

/// Renders seconds in canonical grammar form, dropping sub-minute remainders.
#[must_use]
pub fn render_duration(seconds: u64) -> String {
    let (days, hours, minutes) = split_units(seconds);
    let mut rendered = String::new();
    if days > 0 {
        rendered.push_str(&format!("{days}d"));
    }
    if hours > 0 {
        rendered.push_str(&format!("{hours}h"));
    }
    if minutes > 0 || rendered.is_empty() {
        rendered.push_str(&format!("{minutes}m"));
    }

    rendered
}

/// Describes seconds as `"1 day, 2 hours, 30 minutes"`.
#[must_use]
pub fn describe_duration(seconds: u64) -> String {
    let (days, hours, minutes) = split_units(seconds);
    let parts: Vec<String> = [(days, "day"), (hours, "hour"), (minutes, "minute")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, unit)| {
            if count == 1 {
                format!("{count} {unit}")
            } else {
                format!("{count} {unit}s")
            }
        })
        .collect();

    if parts.is_empty() {
        return "0 minutes".to_owned();
    }

    parts.join(", ")
}

fn split_units(seconds: u64) -> (u64, u64, u64) {
    let days = seconds / SECONDS_PER_DAY;
    let remainder = seconds % SECONDS_PER_DAY;
    let hours = remainder / SECONDS_PER_HOUR;
    let minutes = (remainder % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    (days, hours, minutes)
}

fn out_of_range(text: &str) -> AppError {
    AppError::InvalidFormat(format!("duration '{text}' is out of range"))
}
