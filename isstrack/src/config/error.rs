//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::coord::CoordinateError;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed as INI.
    #[error("Failed to load config from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// A key holds a value of the wrong type.
    #[error("Invalid value for [{section}] {key}: {value:?}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    /// The configured observer is not a valid coordinate.
    #[error("Invalid observer location: {0}")]
    InvalidObserver(CoordinateError),

    /// I/O error while writing the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
