//! Unified error hierarchy for runtrend
//!
//! Per-record problems (a row that cannot be normalized) never surface
//! here: the engine excludes those with an audit note and continues. The
//! variants below are the global failures: bad configuration, unreadable
//! input files, malformed structure.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::ValidationError;

/// Top-level error type for all runtrend operations
#[derive(Debug, Error)]
pub enum RunTrendError {
    /// Invalid engine parameters; fails fast before any computation
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Structural record validation failure
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Data file import failure
    #[error("import error: {0}")]
    Import(#[from] ImportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Import-specific errors for the CSV/JSON data files
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at the expected path
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// No loader handles this file extension
    #[error("unsupported format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Required column missing from a CSV header
    #[error("missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// CSV-level parse failure (encoding, quoting, row shape)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON record file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A row parsed but failed structural validation
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Underlying file read failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type using the unified error
pub type Result<T> = std::result::Result<T, RunTrendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RunTrendError::Configuration("window size must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: window size must be positive"
        );

        let err = ImportError::FileNotFound {
            path: PathBuf::from("data/runs.csv"),
        };
        assert_eq!(err.to_string(), "file not found: data/runs.csv");
    }

    #[test]
    fn test_validation_error_conversion() {
        let validation = ValidationError::NonPositiveRestingHr;
        let err: RunTrendError = validation.into();
        assert!(matches!(err, RunTrendError::Validation(_)));
    }
}
