//! CLI error type and exit codes.

use isstrack::aggregator::AggregatorError;
use isstrack::config::ConfigError;
use isstrack::logging::LoggingError;
use isstrack::provider::SourceError;
use thiserror::Error;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Upstream request failed: {0}")]
    Source(#[from] SourceError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] AggregatorError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Source(_) => 3,
            CliError::Logging(_) | CliError::Tracking(_) | CliError::Runtime(_) => 1,
        }
    }
}
