use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde_yaml::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use logtrail_application::RetentionConfigRepository;
use logtrail_core::{AppError, AppResult};
use logtrail_domain::{ExportFormat, RetentionConfig};

/// Key older documents nest every section under.
const LEGACY_WRAPPER_KEY: &str = "retention";

const SECTION_KEYS: [&str; 4] = ["time_based", "count_based", "export", "schedule"];

/// Retention policy stored as a YAML document on disk.
///
/// Writes go to a temporary file in the target directory and are renamed into
/// place, so readers never observe a partially written document.
#[derive(Debug, Clone)]
pub struct YamlRetentionConfigRepository {
    path: PathBuf,
}

impl YamlRetentionConfigRepository {
    /// Creates a repository for the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl YamlRetentionConfigRepository {
    /// Removes an unrecognized `export.format` so the default applies.
    ///
    /// A hand-edited tag must not block the retention rules; updates through
    /// the policy service still reject unknown formats.
    fn drop_unknown_export_format(&self, document: &mut Value) {
        let Some(export) = document.get_mut("export").and_then(Value::as_mapping_mut) else {
            return;
        };
        let Some(format) = export.get("format") else {
            return;
        };
        if format
            .as_str()
            .is_some_and(|tag| ExportFormat::from_str(tag).is_ok())
        {
            return;
        }

        warn!(
            path = %self.path.display(),
            format = ?format,
            fallback = %ExportFormat::default(),
            "unknown export format in retention policy, using fallback"
        );
        export.remove("format");
    }
}

/// Reads documents that nest the sections under a top-level `retention` key.
fn unwrap_legacy_wrapper(document: Value) -> Value {
    let Value::Mapping(mut mapping) = document else {
        return document;
    };
    let wrapped = mapping
        .get(LEGACY_WRAPPER_KEY)
        .is_some_and(Value::is_mapping);
    let has_sections = SECTION_KEYS.iter().any(|key| mapping.contains_key(*key));
    if !wrapped || has_sections {
        return Value::Mapping(mapping);
    }

    mapping
        .remove(LEGACY_WRAPPER_KEY)
        .unwrap_or(Value::Mapping(mapping))
}

#[async_trait]
impl RetentionConfigRepository for YamlRetentionConfigRepository {
    async fn load(&self) -> AppResult<Option<RetentionConfig>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no retention policy document, using defaults");
                return Ok(None);
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read retention policy '{}': {error}",
                    self.path.display()
                )));
            }
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let invalid = |error: serde_yaml::Error| {
            AppError::ConfigInvalid(format!(
                "failed to parse '{}': {error}",
                self.path.display()
            ))
        };

        let document = serde_yaml::from_str::<Value>(contents.as_str()).map_err(invalid)?;
        if document.is_null() {
            return Ok(None);
        }
        let mut document = unwrap_legacy_wrapper(document);
        self.drop_unknown_export_format(&mut document);

        serde_yaml::from_value::<RetentionConfig>(document)
            .map(Some)
            .map_err(invalid)
    }

    async fn save(&self, config: &RetentionConfig) -> AppResult<()> {
        let document = serde_yaml::to_string(config).map_err(|error| {
            AppError::Internal(format!("failed to serialize retention policy: {error}"))
        })?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(path.as_path(), document.as_bytes()))
            .await
            .map_err(|error| {
                AppError::Internal(format!("retention policy write task failed: {error}"))
            })?
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> AppResult<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let failed = |action: &str, error: std::io::Error| {
        AppError::Internal(format!(
            "failed to {action} for retention policy '{}': {error}",
            path.display()
        ))
    };

    std::fs::create_dir_all(&directory).map_err(|error| failed("create directory", error))?;
    let mut file =
        NamedTempFile::new_in(&directory).map_err(|error| failed("create temp file", error))?;
    file.write_all(contents)
        .map_err(|error| failed("write temp file", error))?;
    file.as_file()
        .sync_all()
        .map_err(|error| failed("sync temp file", error))?;
    file.persist(path)
        .map_err(|error| failed("replace document", error.error))?;

    Ok(())
}
