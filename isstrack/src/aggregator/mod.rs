//! Live position aggregator.
//!
//! The [`Aggregator`] owns the poll cadence for the position source, fires the
//! place-name and pass lookups once per observer coordinate, and merges every
//! result into a single immutable [`Snapshot`].
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start(observer)──► Tracking ──stop()──► Stopped (terminal)
//! ```
//!
//! # Ordering
//!
//! Every poll is tagged with a monotonically increasing tick id. A response
//! whose tick is older than the last applied tick is dropped, so a slow
//! round-trip can never overwrite a newer position. Lookups are tagged with an
//! observer generation in the same way.
//!
//! # Example
//!
//! ```ignore
//! use isstrack::aggregator::{Aggregator, AggregatorConfig, Sources};
//!
//! let sources = Sources::from_endpoints(http, &config.endpoints);
//! let aggregator = Aggregator::new(sources, AggregatorConfig::default())
//!     .with_sink(view_sync);
//!
//! aggregator.start(observer)?;
//! let mut rx = aggregator.subscribe();
//! rx.changed().await?;
//! aggregator.stop();
//! ```

mod session;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{ConfigFile, EndpointConfig, DEFAULT_POLL_INTERVAL_MS};
use crate::coord::Coordinate;
use crate::geocode::{GeocodeResolver, NominatimGeocoder};
use crate::pass::{IssPassPredictor, PassPredictor};
use crate::position::{PositionSource, WhereTheIssSource};
use crate::provider::AsyncHttpClient;
use crate::snapshot::{MergePolicy, Snapshot};

use session::TrackingSession;

/// Receives every published snapshot.
///
/// Called from the aggregator's event loop; implementations must not block.
pub trait SnapshotSink: Send + Sync {
    fn on_snapshot(&self, snapshot: Arc<Snapshot>);
}

impl<F> SnapshotSink for F
where
    F: Fn(Arc<Snapshot>) + Send + Sync,
{
    fn on_snapshot(&self, snapshot: Arc<Snapshot>) {
        self(snapshot)
    }
}

/// The three upstream capabilities the aggregator composes.
#[derive(Clone)]
pub struct Sources {
    pub position: Arc<dyn PositionSource>,
    pub geocode: Arc<GeocodeResolver>,
    pub pass: Arc<dyn PassPredictor>,
}

impl Sources {
    pub fn new(
        position: Arc<dyn PositionSource>,
        geocode: Arc<GeocodeResolver>,
        pass: Arc<dyn PassPredictor>,
    ) -> Self {
        Self {
            position,
            geocode,
            pass,
        }
    }

    /// Build the HTTP-backed sources for the configured endpoints.
    pub fn from_endpoints(http: Arc<dyn AsyncHttpClient>, endpoints: &EndpointConfig) -> Self {
        let position = WhereTheIssSource::with_endpoint(
            Arc::clone(&http),
            &endpoints.position_url,
            endpoints.satellite_id,
        );
        let geocoder = NominatimGeocoder::with_endpoint(Arc::clone(&http), &endpoints.geocode_url);
        let pass = IssPassPredictor::with_endpoint(http, &endpoints.pass_url);

        Self::new(
            Arc::new(position),
            Arc::new(GeocodeResolver::new(Arc::new(geocoder))),
            Arc::new(pass),
        )
    }
}

/// Aggregator tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    /// Interval between position polls.
    pub poll_interval: Duration,
    /// Merge tunables (persistent failure threshold).
    pub merge_policy: MergePolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            merge_policy: MergePolicy::default(),
        }
    }
}

impl AggregatorConfig {
    /// Extract the aggregator settings from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            poll_interval: config.tracking.poll_interval,
            merge_policy: MergePolicy {
                persistent_failure_threshold: config.tracking.persistent_failure_threshold,
            },
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the consecutive failures before a fault becomes persistent.
    pub fn with_persistent_failure_threshold(mut self, threshold: u32) -> Self {
        self.merge_policy.persistent_failure_threshold = threshold;
        self
    }
}

/// Errors returned by aggregator control calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("Tracking already started")]
    AlreadyStarted,

    #[error("Tracking has been stopped")]
    Stopped,

    #[error("Tracking is not running")]
    NotTracking,

    #[error("No Tokio runtime available to run the tracking loop")]
    NoRuntime,

    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Idle,
    Tracking,
    Stopped,
}

struct SessionHandle {
    cancel: CancellationToken,
    observer_tx: mpsc::UnboundedSender<Coordinate>,
}

enum Lifecycle {
    Idle,
    Tracking(SessionHandle),
    Stopped,
}

/// Live position aggregator.
pub struct Aggregator {
    sources: Sources,
    config: AggregatorConfig,
    sinks: Vec<Arc<dyn SnapshotSink>>,
    snapshot_tx: Arc<watch::Sender<Arc<Snapshot>>>,
    lifecycle: Mutex<Lifecycle>,
}

impl Aggregator {
    /// Create an idle aggregator.
    pub fn new(sources: Sources, config: AggregatorConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            sources,
            config,
            sinks: Vec::new(),
            snapshot_tx: Arc::new(snapshot_tx),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Register a push callback for every published snapshot.
    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Begin tracking for `observer`.
    ///
    /// Spawns the tracking loop on the current Tokio runtime. Polling starts
    /// immediately; the place-name and pass lookups run concurrently and never
    /// delay a poll.
    pub fn start(&self, observer: Coordinate) -> Result<(), AggregatorError> {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Tracking(_) => return Err(AggregatorError::AlreadyStarted),
            Lifecycle::Stopped => return Err(AggregatorError::Stopped),
        }

        if self.config.poll_interval.is_zero() {
            return Err(AggregatorError::ZeroPollInterval);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| AggregatorError::NoRuntime)?;

        let cancel = CancellationToken::new();
        let (observer_tx, observer_rx) = mpsc::unbounded_channel();

        let session = TrackingSession::new(
            self.sources.clone(),
            self.config.clone(),
            observer,
            observer_rx,
            self.sinks.clone(),
            Arc::clone(&self.snapshot_tx),
            cancel.clone(),
        );
        runtime.spawn(session.run());

        info!(%observer, interval_ms = self.config.poll_interval.as_millis() as u64, "Tracking started");
        *lifecycle = Lifecycle::Tracking(SessionHandle {
            cancel,
            observer_tx,
        });
        Ok(())
    }

    /// Stop tracking. Idempotent.
    ///
    /// Cancels the poll timer and voids every in-flight request; responses
    /// arriving afterwards are discarded without publishing. On a
    /// current-thread runtime no sink is called once this returns; on a
    /// multi-threaded runtime a sink call already in progress may finish.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Tracking(handle) => {
                handle.cancel.cancel();
                info!("Tracking stopped");
            }
            Lifecycle::Idle => debug!("Stop requested before start"),
            Lifecycle::Stopped => {}
        }
    }

    /// Move the observer; lookups re-run only if the coordinate changed.
    pub fn update_observer(&self, observer: Coordinate) -> Result<(), AggregatorError> {
        match &*self.lifecycle.lock() {
            Lifecycle::Tracking(handle) => handle
                .observer_tx
                .send(observer)
                .map_err(|_| AggregatorError::NotTracking),
            Lifecycle::Idle => Err(AggregatorError::NotTracking),
            Lifecycle::Stopped => Err(AggregatorError::Stopped),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AggregatorState {
        match *self.lifecycle.lock() {
            Lifecycle::Idle => AggregatorState::Idle,
            Lifecycle::Tracking(_) => AggregatorState::Tracking,
            Lifecycle::Stopped => AggregatorState::Stopped,
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot_tx.borrow())
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.stop();
    }
}
