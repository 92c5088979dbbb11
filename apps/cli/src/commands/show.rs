//! `logtrail show`

use std::io::Write;

use logtrail_application::RetentionInfo;
use serde::Serialize;

use super::CommandContext;
use crate::error::CliError;
use crate::output::{Render, format_count};

/// Policy and statistics as printed by `show`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ShowReport {
    pub info: RetentionInfo,
}

pub async fn execute(context: &CommandContext) -> Result<ShowReport, CliError> {
    let retention = context.retention_service().await?;
    let info = retention.retention_info().await?;
    Ok(ShowReport { info })
}

impl Render for ShowReport {
    fn render_text(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        let config = &self.info.config;
        let statistics = &self.info.statistics;

        writeln!(writer, "=== Current Retention Settings ===")?;
        writeln!(writer)?;
        writeln!(writer, "Time-based retention:")?;
        writeln!(writer, "  Enabled: {}", config.time_based.enabled)?;
        writeln!(writer, "  Duration: {}", config.time_based.duration)?;
        writeln!(writer)?;
        writeln!(writer, "Count-based retention:")?;
        writeln!(writer, "  Enabled: {}", config.count_based.enabled)?;
        writeln!(
            writer,
            "  Max entries: {}",
            format_count(config.count_based.max_entries)
        )?;
        writeln!(writer)?;
        writeln!(writer, "Export settings:")?;
        writeln!(writer, "  Enabled: {}", config.export.enabled)?;
        writeln!(writer, "  Format: {}", config.export.format)?;
        writeln!(writer, "  Output directory: {}", config.export.output_directory)?;
        writeln!(writer)?;
        writeln!(writer, "Schedule:")?;
        writeln!(writer, "  On startup: {}", config.schedule.on_startup)?;
        writeln!(writer, "  Interval hours: {}", config.schedule.interval_hours)?;
        writeln!(
            writer,
            "  Last execution: {}",
            config.schedule.last_execution.as_deref().unwrap_or("never")
        )?;
        writeln!(writer)?;
        writeln!(writer, "=== Database Statistics ===")?;
        writeln!(
            writer,
            "Total records: {}",
            format_count(statistics.total_records)
        )?;
        writeln!(
            writer,
            "Oldest record: {}",
            describe_moment(statistics.oldest_record.map(|at| at.to_string()))
        )?;
        writeln!(
            writer,
            "Newest record: {}",
            describe_moment(statistics.newest_record.map(|at| at.to_string()))
        )?;
        writeln!(
            writer,
            "Records to delete (time-based): {}",
            format_count(statistics.time_based_candidates)
        )?;
        writeln!(
            writer,
            "Records to delete (count-based): {}",
            format_count(statistics.count_based_candidates)
        )?;
        writeln!(
            writer,
            "Total records to delete: {}",
            format_count(statistics.total_candidates)
        )
    }
}

fn describe_moment(value: Option<String>) -> String {
    value.unwrap_or_else(|| "none".to_owned())
}
