use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;
use tracing::info;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use logtrail_application::RecordArchiver;
use logtrail_core::{AppError, AppResult};
use logtrail_domain::{ExportFormat, ExportSettings, LogRecord};

const ARCHIVE_STEM: &str = "deleted_logs";

const CSV_HEADER: [&str; 12] = [
    "id",
    "timestamp",
    "datetime",
    "name",
    "level",
    "message",
    "pathname",
    "lineno",
    "function",
    "args",
    "exc_info",
    "extra_metadata",
];

/// Writes doomed records as CSV inside a ZIP or gzip archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRecordArchiver;

impl CsvRecordArchiver {
    /// Creates an archiver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordArchiver for CsvRecordArchiver {
    async fn export(&self, records: &[LogRecord], settings: &ExportSettings) -> AppResult<String> {
        let stem = archive_stem(settings.include_timestamp);
        let directory = PathBuf::from(settings.output_directory.as_str());
        let format = settings.format;
        let records = records.to_vec();

        let path = tokio::task::spawn_blocking(move || {
            write_archive(directory.as_path(), stem.as_str(), format, &records)
        })
        .await
        .map_err(|error| AppError::ExportFailed(format!("archive task failed: {error}")))??;

        let location = path.display().to_string();
        info!(path = %location, format = %format, "retention archive written");
        Ok(location)
    }
}

fn archive_stem(include_timestamp: bool) -> String {
    if include_timestamp {
        format!("{ARCHIVE_STEM}_{}", Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        ARCHIVE_STEM.to_owned()
    }
}

fn write_archive(
    directory: &Path,
    stem: &str,
    format: ExportFormat,
    records: &[LogRecord],
) -> AppResult<PathBuf> {
    std::fs::create_dir_all(directory).map_err(|error| {
        AppError::ExportFailed(format!(
            "failed to create export directory '{}': {error}",
            directory.display()
        ))
    })?;

    let csv = render_csv(records)?;
    let path = directory.join(format!("{stem}.{}", format.file_extension()));
    let failed = |error: String| {
        AppError::ExportFailed(format!("failed to write '{}': {error}", path.display()))
    };

    // Readers only ever see a complete archive under the final name.
    let staged = NamedTempFile::new_in(directory).map_err(|error| failed(error.to_string()))?;
    match format {
        ExportFormat::CsvZip => {
            write_zip(staged.as_file(), format!("{stem}.csv").as_str(), &csv)
        }
        ExportFormat::CsvGzip => write_gzip(staged.as_file(), &csv),
    }
    .map_err(failed)?;
    staged
        .persist(&path)
        .map_err(|error| failed(error.error.to_string()))?;

    Ok(path)
}

fn render_csv(records: &[LogRecord]) -> AppResult<Vec<u8>> {
    let failed = |error: csv::Error| AppError::ExportFailed(format!("failed to render CSV: {error}"));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(failed)?;
    for record in records {
        writer
            .write_record([
                record.id.to_string(),
                record.timestamp.to_string(),
                record
                    .datetime()
                    .map(|datetime| datetime.to_rfc3339_opts(SecondsFormat::Micros, true))
                    .unwrap_or_default(),
                record.name.clone(),
                record.level.as_str().to_owned(),
                record.message.clone(),
                record.pathname.clone().unwrap_or_default(),
                record
                    .lineno
                    .map(|lineno| lineno.to_string())
                    .unwrap_or_default(),
                record.function.clone().unwrap_or_default(),
                json_cell(record.args.as_ref()),
                record.exc_info.clone().unwrap_or_default(),
                json_cell(record.metadata.as_ref()),
            ])
            .map_err(failed)?;
    }

    writer
        .into_inner()
        .map_err(|error| AppError::ExportFailed(format!("failed to flush CSV: {error}")))
}

fn json_cell(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_default()
}

fn write_zip(file: &File, entry_name: &str, csv: &[u8]) -> Result<(), String> {
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    archive
        .start_file(entry_name, options)
        .map_err(|error| error.to_string())?;
    archive.write_all(csv).map_err(|error| error.to_string())?;
    let file = archive.finish().map_err(|error| error.to_string())?;
    file.sync_all().map_err(|error| error.to_string())
}

fn write_gzip(file: &File, csv: &[u8]) -> Result<(), String> {
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(csv).map_err(|error| error.to_string())?;
    let file = encoder.finish().map_err(|error| error.to_string())?;
    file.sync_all().map_err(|error| error.to_string())
}
