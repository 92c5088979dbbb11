//! `logtrail cleanup`

use std::io::Write;

use logtrail_application::CleanupResult;
use serde::Serialize;
use tracing::debug;

use super::CommandContext;
use crate::cli::CleanupArgs;
use crate::error::CliError;
use crate::output::{Render, format_count};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CleanupReport {
    pub result: CleanupResult,
}

pub async fn execute(context: &CommandContext, args: &CleanupArgs) -> Result<CleanupReport, CliError> {
    let retention = context.retention_service().await?;
    debug!(dry_run = args.dry_run, "running retention pass from the command line");

    let result = retention.cleanup(args.dry_run).await?;
    Ok(CleanupReport { result })
}

impl Render for CleanupReport {
    fn render_text(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        let result = &self.result;
        if result.dry_run {
            writeln!(writer, "=== Dry Run: Preview Cleanup ===")?;
        } else {
            writeln!(writer, "=== Running Cleanup ===")?;
        }

        writeln!(writer, "Records deleted: {}", format_count(result.records_deleted))?;
        writeln!(
            writer,
            "Time-based deletions: {}",
            format_count(result.time_based_deletions)
        )?;
        writeln!(
            writer,
            "Count-based deletions: {}",
            format_count(result.count_based_deletions)
        )?;
        if let Some(export_file) = &result.export_file {
            writeln!(writer, "Export file: {export_file}")?;
        }
        for failure in &result.failures {
            writeln!(writer, "Warning: {failure}")?;
        }
        if result.dry_run {
            writeln!(writer)?;
            writeln!(
                writer,
                "Note: This was a dry run. No records were actually deleted."
            )?;
        }

        Ok(())
    }
}
