//! Error types for the analytics backend

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the analytics backend
///
/// Query operations only ever produce [`Error::NotFound`] (single-item lookups) and
/// [`Error::InvalidArgument`] (malformed parameters). Aggregations over an empty or
/// filtered-out table are valid empty results and never error.
#[derive(Error, Debug)]
pub enum Error {
    /// Single-entity lookup had no match
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-bound argument (bad date string, invalid threshold)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Optional dataset is absent; queries degrade to empty results
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Required dataset could not be loaded; the process must not serve traffic
    #[error("Startup failure: {0}")]
    StartupFailure(#[from] LoadError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding/decoding error outside of dataset loading
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Dataset loading errors
///
/// Every variant carries the path of the file being loaded so startup logs point at
/// the offending source.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Source file does not exist
    #[error("file not found: {}", path.display())]
    MissingFile {
        /// Configured path of the dataset
        path: PathBuf,
    },

    /// Header lacks one or more required columns
    #[error("{} is missing required columns: {}", path.display(), columns.join(", "))]
    MissingColumns {
        /// Path of the dataset
        path: PathBuf,
        /// Names of the absent columns
        columns: Vec<String>,
    },

    /// Malformed delimited data
    #[error("failed to parse {}: {source}", path.display())]
    Csv {
        /// Path of the dataset
        path: PathBuf,
        /// Underlying reader error
        #[source]
        source: csv::Error,
    },

    /// IO failure while opening or reading the file
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path of the dataset
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Whether the error only means the file is absent
    pub fn is_missing_file(&self) -> bool {
        matches!(self, LoadError::MissingFile { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_messages_name_the_file() {
        let err = LoadError::MissingColumns {
            path: PathBuf::from("data/products.csv"),
            columns: vec!["price".to_string(), "brand".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "data/products.csv is missing required columns: price, brand"
        );

        let err = LoadError::MissingFile {
            path: PathBuf::from("data/sales.csv"),
        };
        assert!(err.is_missing_file());
        assert_eq!(err.to_string(), "file not found: data/sales.csv");
    }

    #[test]
    fn test_startup_failure_wraps_load_error() {
        let err: Error = LoadError::MissingFile {
            path: PathBuf::from("x.csv"),
        }
        .into();
        assert!(matches!(err, Error::StartupFailure(_)));
        assert_eq!(err.to_string(), "Startup failure: file not found: x.csv");
    }
}
