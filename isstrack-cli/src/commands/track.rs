//! Track command - live headless tracking until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use isstrack::aggregator::{Aggregator, AggregatorConfig, Sources};
use isstrack::presentation::format_observer;
use isstrack::view_sync::{ViewSync, ViewSyncConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::console::{ConsoleCamera, SnapshotPrinter};
use crate::error::CliError;
use crate::runner::{CliRunner, ObserverArgs};

/// Arguments for the track command.
pub struct TrackArgs {
    pub config: Option<PathBuf>,
    pub observer: ObserverArgs,
    /// Stop after this long instead of waiting for Ctrl-C.
    pub duration: Option<Duration>,
}

/// Run the track command.
pub fn run(args: TrackArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config)?;
    runner.log_startup("track");

    let config = runner.config();
    let observer = runner.observer(args.observer)?;
    let http = runner.http_client()?;
    let runtime = runner.runtime()?;

    let shutdown = CancellationToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_token.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("Failed to install Ctrl-C handler: {}", e)))?;

    println!("Tracking the ISS from {}", format_observer(observer));
    println!("Press Ctrl+C to stop.");
    println!();

    runtime.block_on(async {
        let camera = Arc::new(ConsoleCamera::new(tokio::runtime::Handle::current(), observer));
        let view = Arc::new(ViewSync::new(camera, ViewSyncConfig::from_config_file(config)));

        let aggregator = Aggregator::new(
            Sources::from_endpoints(http, &config.endpoints),
            AggregatorConfig::from_config_file(config),
        )
        .with_sink(Arc::new(SnapshotPrinter::new()))
        .with_sink(view.clone());

        aggregator.start(observer)?;

        match args.duration {
            Some(limit) => {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::time::sleep(limit) => info!("Tracking duration elapsed"),
                }
            }
            None => shutdown.cancelled().await,
        }

        aggregator.stop();
        view.cancel();
        Ok::<(), CliError>(())
    })?;

    println!();
    println!("Tracking stopped.");
    Ok(())
}
