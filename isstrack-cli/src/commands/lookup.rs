//! One-shot lookups: `position`, `locate`, `pass`.

use std::path::PathBuf;
use std::sync::Arc;

use isstrack::geocode::{GeocodeResolver, NominatimGeocoder};
use isstrack::pass::{IssPassPredictor, PassPredictor};
use isstrack::position::{PositionSource, WhereTheIssSource};
use isstrack::presentation::{describe_pass, format_hemisphere, format_observer};
use isstrack::provider::SourceError;

use crate::error::CliError;
use crate::runner::{CliRunner, ObserverArgs};

/// Print the current ISS position.
pub fn run_position(config: Option<PathBuf>) -> Result<(), CliError> {
    let runner = CliRunner::new(config)?;
    runner.log_startup("position");

    let endpoints = &runner.config().endpoints;
    let source = WhereTheIssSource::with_endpoint(
        runner.http_client()?,
        &endpoints.position_url,
        endpoints.satellite_id,
    );

    let sample = runner.runtime()?.block_on(source.poll())?;
    println!("{}", format_hemisphere(sample.coordinate));
    println!(
        "Observed at {}",
        sample.observed_at.with_timezone(&chrono::Local).format("%H:%M:%S")
    );
    Ok(())
}

/// Print the place name for the observer.
pub fn run_locate(config: Option<PathBuf>, observer: ObserverArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config)?;
    runner.log_startup("locate");

    let observer = runner.observer(observer)?;
    let geocoder =
        NominatimGeocoder::with_endpoint(runner.http_client()?, &runner.config().endpoints.geocode_url);
    let resolver = GeocodeResolver::new(Arc::new(geocoder));

    let place = runner.runtime()?.block_on(resolver.resolve(observer));
    println!("{} ({})", place, format_observer(observer));
    Ok(())
}

/// Print the next pass over the observer.
pub fn run_pass(config: Option<PathBuf>, observer: ObserverArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config)?;
    runner.log_startup("pass");

    let observer = runner.observer(observer)?;
    let predictor =
        IssPassPredictor::with_endpoint(runner.http_client()?, &runner.config().endpoints.pass_url);

    match runner.runtime()?.block_on(predictor.next_pass(observer)) {
        Ok(pass) => {
            println!("Next pass over {}:", format_observer(observer));
            println!("  {}", describe_pass(&pass));
            Ok(())
        }
        Err(SourceError::NoUpcomingPass) => {
            println!("No upcoming passes found");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
