//! `logtrail update`

use std::io::Write;

use logtrail_core::AppError;
use logtrail_domain::RetentionConfig;
use serde::Serialize;

use super::CommandContext;
use crate::cli::UpdateArgs;
use crate::error::CliError;
use crate::output::{Render, format_count};

/// Settings after an update, with the changes that were applied.
#[derive(Debug, Serialize)]
pub struct UpdateReport {
    pub changes: Vec<String>,
    pub config: RetentionConfig,
}

/// Validates and saves the requested changes; nothing is written on error.
pub async fn execute(context: &CommandContext, args: &UpdateArgs) -> Result<UpdateReport, CliError> {
    let update = args.to_update();
    if update.is_empty() {
        return Err(AppError::Validation("no settings to update".to_owned()).into());
    }

    let config = context.policy_service().update(update).await?;
    Ok(UpdateReport {
        changes: describe_changes(args, &config),
        config,
    })
}

fn describe_changes(args: &UpdateArgs, config: &RetentionConfig) -> Vec<String> {
    let mut changes = Vec::new();
    if args.time_duration.is_some() {
        changes.push(format!(
            "Updated time-based duration to: {}",
            config.time_based.duration
        ));
    }
    if let Some(enabled) = args.time_enabled {
        changes.push(format!("Time-based retention enabled: {enabled}"));
    }
    if args.count_max.is_some() {
        changes.push(format!(
            "Updated max entries to: {}",
            format_count(config.count_based.max_entries)
        ));
    }
    if let Some(enabled) = args.count_enabled {
        changes.push(format!("Count-based retention enabled: {enabled}"));
    }
    if let Some(enabled) = args.export_enabled {
        changes.push(format!("Export enabled: {enabled}"));
    }
    if args.export_dir.is_some() {
        changes.push(format!(
            "Export directory updated to: {}",
            config.export.output_directory
        ));
    }
    if args.export_format.is_some() {
        changes.push(format!("Export format updated to: {}", config.export.format));
    }
    if let Some(include_timestamp) = args.export_timestamp {
        changes.push(format!("Export file timestamps: {include_timestamp}"));
    }
    if args.interval_hours.is_some() {
        changes.push(format!(
            "Updated interval hours to: {}",
            config.schedule.interval_hours
        ));
    }
    if let Some(on_startup) = args.on_startup {
        changes.push(format!("Run on startup: {on_startup}"));
    }
    changes
}

impl Render for UpdateReport {
    fn render_text(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        for change in &self.changes {
            writeln!(writer, "{change}")?;
        }
        writeln!(writer)?;
        writeln!(writer, "Settings saved successfully!")
    }
}
