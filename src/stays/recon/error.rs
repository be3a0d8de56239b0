use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReconError>;

/// Error type covering the failure cases of a reconciliation run.
///
/// Every variant is fatal for the run. Nothing is recovered and continued,
/// so a report is only ever produced from complete data on both sides.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Wrapper for IO failures such as reading the environment file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the workbook cannot be opened or a sheet cannot be parsed.
    #[error("Excel read error in {path}: {source}")]
    ExcelRead {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a required configuration value is absent.
    #[error("missing configuration {keys} in {path}")]
    MissingConfig { keys: String, path: PathBuf },

    /// Raised when the environment file exists but cannot be parsed.
    #[error("invalid environment file {path}: {message}")]
    InvalidEnvFile { path: PathBuf, message: String },

    /// Raised when the check-in range is inverted or malformed.
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    /// Raised when the remote store answers with a non-success status.
    #[error("remote store returned HTTP {status} for {url}: {excerpt}")]
    Http {
        status: u16,
        url: String,
        excerpt: String,
    },

    /// Transport-level failures: connection refused, timeout, TLS.
    #[error("remote store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Raised when a response body is valid JSON but not an array.
    #[error("unexpected response shape at offset {offset}: expected a JSON array, got {excerpt}")]
    UnexpectedShape { offset: usize, excerpt: String },

    /// Raised when an array element fails validation against the row type.
    #[error("invalid record at offset {offset}: {message}")]
    InvalidRecord { offset: usize, message: String },

    /// Raised when an explicitly requested column is not in the workbook.
    #[error("column '{0}' not found or holds no identifiers")]
    UnknownColumn(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Truncates a response body for inclusion in an error message.
pub(crate) fn excerpt(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
