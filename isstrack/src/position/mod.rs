//! Position source for the tracked satellite.
//!
//! A [`PositionSource`] performs exactly one request per [`poll`](PositionSource::poll).
//! Retry policy belongs to the aggregator: the next scheduled tick is the retry.

mod wheretheiss;

pub use wheretheiss::{WhereTheIssSource, DEFAULT_POSITION_URL, ISS_NORAD_ID};

use chrono::{DateTime, Utc};

use crate::coord::Coordinate;
use crate::provider::{BoxFuture, SourceError};

/// A single observed position of the tracked object.
///
/// Produced on every successful poll and superseded by the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    /// Where the object was.
    pub coordinate: Coordinate,
    /// When it was there.
    pub observed_at: DateTime<Utc>,
}

impl PositionSample {
    /// Create a sample observed now.
    pub fn now(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            observed_at: Utc::now(),
        }
    }

    /// Create a sample with an explicit observation time.
    pub fn at(coordinate: Coordinate, observed_at: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            observed_at,
        }
    }
}

/// Fetches the tracked object's current coordinates.
pub trait PositionSource: Send + Sync {
    /// Fetch the current position.
    ///
    /// Fails with `UpstreamUnavailable` or `Parse`; never retries internally.
    fn poll(&self) -> BoxFuture<'_, Result<PositionSample, SourceError>>;
}
