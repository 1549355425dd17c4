//! Tracing subscriber setup.
//!
//! Installs a stderr formatter plus an optional non-blocking file writer. The
//! `RUST_LOG` environment variable takes precedence over the configured level.

use std::fs::OpenOptions;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Keeps the file writer flushing until dropped.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Errors that can occur while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter {0:?}")]
    Filter(String),

    #[error("Failed to open log file: {0}")]
    File(#[from] std::io::Error),

    #[error("A global subscriber is already installed")]
    AlreadyInstalled,
}

/// Build the filter from `RUST_LOG`, falling back to the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|_| LoggingError::Filter(level.to_string())),
    }
}

/// Install the global subscriber.
///
/// Hold the returned guard for the life of the process or buffered file
/// output may be lost.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard, LoggingError> {
    let filter = build_filter(&config.level)?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .boxed();

    let (file_layer, file_guard) = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}
