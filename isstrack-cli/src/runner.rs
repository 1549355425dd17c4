//! Shared setup for every command: config, logging, HTTP client, runtime.

use std::path::PathBuf;
use std::sync::Arc;

use isstrack::config::ConfigFile;
use isstrack::coord::Coordinate;
use isstrack::logging::{init_logging, LogGuard};
use isstrack::provider::{AsyncHttpClient, ReqwestClient};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Observer override from `--lat` / `--lng`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObserverArgs {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Loaded configuration plus the process-wide logging guard.
pub struct CliRunner {
    config: ConfigFile,
    config_path: Option<PathBuf>,
    _log_guard: LogGuard,
}

impl CliRunner {
    /// Load the configuration and install logging.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config_path = config_path.or_else(ConfigFile::default_path);
        let config = match &config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let log_guard = init_logging(&config.logging)?;

        Ok(Self {
            config,
            config_path,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = isstrack::VERSION,
            command,
            config = ?self.config_path,
            "isstrack starting"
        );
    }

    /// The observer: CLI flags first, then the configured location.
    pub fn observer(&self, args: ObserverArgs) -> Result<Coordinate, CliError> {
        let configured = &self.config.observer;
        let lat = args.lat.unwrap_or(configured.latitude);
        let lng = args.lng.unwrap_or(configured.longitude);
        Coordinate::new(lat, lng).map_err(|e| CliError::Config(e.to_string()))
    }

    /// HTTP client with the configured timeout.
    pub fn http_client(&self) -> Result<Arc<dyn AsyncHttpClient>, CliError> {
        let client = ReqwestClient::with_timeout(self.config.tracking.request_timeout_secs)?;
        Ok(Arc::new(client))
    }

    /// Single-threaded runtime: the tracking loop relies on one event loop.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))
    }
}
