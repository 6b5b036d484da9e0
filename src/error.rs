use thiserror::Error;

/// Errors raised while rendering or exporting a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// The requested export kind is not one the engine knows how to produce
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to serialize JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write CSV table: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
