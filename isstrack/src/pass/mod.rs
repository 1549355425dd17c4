//! Next-pass prediction for an observer.
//!
//! A [`PassPredictor`] answers "when does the station next rise over this
//! coordinate, and for how long is it visible". An empty answer is reported as
//! [`SourceError::NoUpcomingPass`], which callers treat as a valid state.

mod iss_pass;

pub use iss_pass::{IssPassPredictor, DEFAULT_PASS_URL};

use chrono::{DateTime, Utc};

use crate::coord::Coordinate;
use crate::provider::{BoxFuture, SourceError};

/// The next visibility window over an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassWindow {
    /// When the station rises above the horizon.
    pub rise_time: DateTime<Utc>,
    /// How long it stays visible, in seconds.
    pub duration_seconds: u32,
}

impl PassWindow {
    pub fn new(rise_time: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self {
            rise_time,
            duration_seconds,
        }
    }

    /// When the station sets again.
    pub fn set_time(&self) -> DateTime<Utc> {
        self.rise_time + chrono::Duration::seconds(i64::from(self.duration_seconds))
    }
}

/// Fetches the next pass for an observer coordinate.
pub trait PassPredictor: Send + Sync {
    /// Predict the next pass.
    ///
    /// Fails with `UpstreamUnavailable`, `Parse`, or `NoUpcomingPass`.
    fn next_pass(&self, observer: Coordinate) -> BoxFuture<'_, Result<PassWindow, SourceError>>;
}
