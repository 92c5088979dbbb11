use logtrail_core::AppError;

/// Failure of a CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error reported by the retention services.
    #[error("{0}")]
    App(#[from] AppError),

    /// JSON output could not be rendered.
    #[error("json output error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the terminal failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
