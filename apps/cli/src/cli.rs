//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use logtrail_domain::{
    CountBasedRetentionUpdate, ExportSettingsUpdate, RetentionConfigUpdate,
    RetentionScheduleUpdate, TimeBasedRetentionUpdate,
};

/// Manage logtrail log retention.
#[derive(Parser, Debug)]
#[command(name = "logtrail", version, about, long_about = None)]
pub struct Cli {
    /// Path to the retention policy document.
    #[arg(
        long,
        global = true,
        env = "RETENTION_CONFIG_PATH",
        default_value = "retention_config.yml"
    )]
    pub config: PathBuf,

    /// Record store location.
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "sqlite://logtrail.db?mode=rwc"
    )]
    pub database_url: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the retention policy and store statistics.
    Show,

    /// Run a retention pass now.
    Cleanup(CleanupArgs),

    /// Change retention settings.
    Update(UpdateArgs),
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Report what would be deleted without deleting or exporting.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Age window, for example "7d" or "2d12h".
    #[arg(long)]
    pub time_duration: Option<String>,

    /// Enable or disable the age rule.
    #[arg(long, value_name = "BOOL")]
    pub time_enabled: Option<bool>,

    /// Maximum number of records to keep.
    #[arg(long, allow_negative_numbers = true)]
    pub count_max: Option<i64>,

    /// Enable or disable the size rule.
    #[arg(long, value_name = "BOOL")]
    pub count_enabled: Option<bool>,

    /// Enable or disable archiving of deleted records.
    #[arg(long, value_name = "BOOL")]
    pub export_enabled: Option<bool>,

    /// Directory archives are written to.
    #[arg(long)]
    pub export_dir: Option<String>,

    /// Archive format (csv_zip, csv_gzip).
    #[arg(long)]
    pub export_format: Option<String>,

    /// Append a timestamp to archive file names.
    #[arg(long, value_name = "BOOL")]
    pub export_timestamp: Option<bool>,

    /// Hours between scheduled passes.
    #[arg(long, allow_negative_numbers = true)]
    pub interval_hours: Option<i64>,

    /// Run a pass when the server starts.
    #[arg(long, value_name = "BOOL")]
    pub on_startup: Option<bool>,
}

impl UpdateArgs {
    /// Groups the flags into a sectioned update; sections without flags stay `None`.
    pub fn to_update(&self) -> RetentionConfigUpdate {
        let time_based = (self.time_duration.is_some() || self.time_enabled.is_some()).then(|| {
            TimeBasedRetentionUpdate {
                enabled: self.time_enabled,
                duration: self.time_duration.clone(),
            }
        });
        let count_based = (self.count_max.is_some() || self.count_enabled.is_some()).then(|| {
            CountBasedRetentionUpdate {
                enabled: self.count_enabled,
                max_entries: self.count_max,
            }
        });
        let export = (self.export_enabled.is_some()
            || self.export_dir.is_some()
            || self.export_format.is_some()
            || self.export_timestamp.is_some())
        .then(|| ExportSettingsUpdate {
            enabled: self.export_enabled,
            format: self.export_format.clone(),
            output_directory: self.export_dir.clone(),
            include_timestamp: self.export_timestamp,
        });
        let schedule = (self.interval_hours.is_some() || self.on_startup.is_some()).then(|| {
            RetentionScheduleUpdate {
                on_startup: self.on_startup,
                interval_hours: self.interval_hours,
            }
        });

        RetentionConfigUpdate {
            time_based,
            count_based,
            export,
            schedule,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, OutputFormat};

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(error) => panic!("failed to parse {args:?}: {error}"),
        }
    }

    #[test]
    fn cleanup_defaults_to_a_real_pass() {
        let cli = parse(&["logtrail", "cleanup"]);
        match cli.command {
            Commands::Cleanup(args) => assert!(!args.dry_run),
            _ => panic!("expected cleanup"),
        }
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = parse(&[
            "logtrail",
            "cleanup",
            "--dry-run",
            "--output",
            "json",
            "--config",
            "/tmp/policy.yml",
        ]);

        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.config, std::path::PathBuf::from("/tmp/policy.yml"));
        assert!(matches!(cli.command, Commands::Cleanup(ref args) if args.dry_run));
    }

    #[test]
    fn update_flags_group_into_sections() {
        let cli = parse(&[
            "logtrail",
            "update",
            "--time-duration",
            "2d12h",
            "--count-max",
            "500",
            "--on-startup",
            "false",
        ]);
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };

        let update = args.to_update();
        let time_based = update.time_based.unwrap_or_default();
        assert_eq!(time_based.duration.as_deref(), Some("2d12h"));
        assert_eq!(time_based.enabled, None);
        assert_eq!(update.count_based.unwrap_or_default().max_entries, Some(500));
        assert!(update.export.is_none());
        assert_eq!(update.schedule.unwrap_or_default().on_startup, Some(false));
    }

    #[test]
    fn negative_counts_reach_validation() {
        let cli = parse(&["logtrail", "update", "--count-max", "-5"]);
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };

        assert_eq!(args.count_max, Some(-5));
    }

    #[test]
    fn boolean_flags_require_a_value() {
        assert!(Cli::try_parse_from(["logtrail", "update", "--time-enabled", "maybe"]).is_err());
    }

    #[test]
    fn update_without_flags_is_empty() {
        let cli = parse(&["logtrail", "update"]);
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };

        assert!(args.to_update().is_empty());
    }
}
