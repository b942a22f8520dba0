//! Error types for ingestion and metro resolution.

use std::path::PathBuf;

/// A single raw row that could not be turned into a place record.
///
/// Row errors are recoverable: the row is skipped and counted against
/// [`MetroConfig::max_import_errors`](crate::MetroConfig::max_import_errors).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("expected at least {expected} fields, found {found}")]
    MissingFields { expected: usize, found: usize },
    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} out of range: {value}")]
    CoordinateOutOfRange { field: &'static str, value: f64 },
    #[error("duplicate place id {0}")]
    DuplicateId(u64),
    #[error("invalid UTF-8 after byte {valid_up_to}")]
    InvalidEncoding { valid_up_to: usize },
}

/// Fatal errors that abort a resolution run.
#[derive(Debug, thiserror::Error)]
pub enum MetroError {
    #[error("Too many import errors ({errors}, limit {limit}), aborting")]
    TooManyImportErrors { errors: usize, limit: usize },
    #[error("Metro table unavailable at {}: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "http")]
    #[error("Download failed: {0}")]
    Download(String),
}

impl MetroError {
    pub(crate) fn store(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StoreUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
