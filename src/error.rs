use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type TableResult<T> = Result<T, TableError>;

/// Everything that can go wrong while loading, validating or querying a
/// calibration table.
#[derive(Debug, Error)]
pub enum TableError {
    /// A data line that does not split into six usable fields.
    #[error("line {line}: malformed row ({reason}): '{text}'")]
    MalformedRow {
        line: usize,
        text: String,
        reason: String,
    },

    /// The same instrument/filter key appears twice.
    #[error("line {line}: duplicate key '{key}' (first defined on line {first_line})")]
    DuplicateKey {
        key: String,
        first_line: usize,
        line: usize,
    },

    /// A row parsed cleanly but breaks a calibration invariant.
    #[error("line {line}: invalid calibration for '{key}': {reason}")]
    InvariantViolation {
        line: usize,
        key: String,
        reason: String,
    },

    /// Lookup of a key the table does not contain.
    #[error("no calibration entry for key '{key}'")]
    KeyNotFound { key: String },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported table format: .{0}")]
    UnsupportedFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid load options: {0}")]
    Config(String),

    /// The process-wide table was already set.
    #[error("a calibration table is already installed")]
    AlreadyInstalled,
}

impl TableError {
    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            TableError::MalformedRow { line, .. }
            | TableError::DuplicateKey { line, .. }
            | TableError::InvariantViolation { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Instrument/filter key the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            TableError::DuplicateKey { key, .. }
            | TableError::InvariantViolation { key, .. }
            | TableError::KeyNotFound { key } => Some(key),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TableError::Io {
            path: path.into(),
            source,
        }
    }
}
