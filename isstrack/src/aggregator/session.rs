//! The tracking event loop.
//!
//! One task per tracking session. Polls, lookups, observer changes and
//! cancellation are multiplexed with `select!`; the loop is the only writer of
//! the current snapshot, so no locking is needed around the merge.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AggregatorConfig, SnapshotSink, Sources};
use crate::coord::Coordinate;
use crate::geocode::PlaceName;
use crate::pass::PassWindow;
use crate::position::PositionSample;
use crate::provider::{BoxFuture, SourceError};
use crate::snapshot::{Snapshot, SnapshotUpdate};

type PollFuture = BoxFuture<'static, (u64, Result<PositionSample, SourceError>)>;
type LookupFuture = BoxFuture<'static, (u64, LookupOutcome)>;

enum LookupOutcome {
    Place(Result<PlaceName, SourceError>),
    Pass(Result<PassWindow, SourceError>),
}

pub(super) struct TrackingSession {
    sources: Sources,
    config: AggregatorConfig,
    observer: Coordinate,
    observer_rx: mpsc::UnboundedReceiver<Coordinate>,
    sinks: Vec<Arc<dyn SnapshotSink>>,
    snapshot_tx: Arc<watch::Sender<Arc<Snapshot>>>,
    cancel: CancellationToken,
    current: Arc<Snapshot>,
    /// Observer generation; bumped on every observer change.
    generation: u64,
    /// Id handed to the most recently issued poll.
    last_issued_tick: u64,
    /// Id of the most recently applied poll response.
    last_applied_tick: u64,
}

impl TrackingSession {
    pub(super) fn new(
        sources: Sources,
        config: AggregatorConfig,
        observer: Coordinate,
        observer_rx: mpsc::UnboundedReceiver<Coordinate>,
        sinks: Vec<Arc<dyn SnapshotSink>>,
        snapshot_tx: Arc<watch::Sender<Arc<Snapshot>>>,
        cancel: CancellationToken,
    ) -> Self {
        let current = Arc::clone(&snapshot_tx.borrow());
        Self {
            sources,
            config,
            observer,
            observer_rx,
            sinks,
            snapshot_tx,
            cancel,
            current,
            generation: 0,
            last_issued_tick: 0,
            last_applied_tick: 0,
        }
    }

    pub(super) async fn run(mut self) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut polls: FuturesUnordered<PollFuture> = FuturesUnordered::new();
        let mut lookups: FuturesUnordered<LookupFuture> = FuturesUnordered::new();

        self.begin_observer(&mut lookups);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                Some(observer) = self.observer_rx.recv() => {
                    self.change_observer(observer, &mut lookups);
                }

                _ = interval.tick() => {
                    polls.push(self.issue_poll());
                }

                Some((tick, result)) = polls.next(), if !polls.is_empty() => {
                    self.apply_poll(tick, result);
                }

                Some((generation, outcome)) = lookups.next(), if !lookups.is_empty() => {
                    self.apply_lookup(generation, outcome);
                }
            }
        }

        // Dropping the futures cancels the requests; nothing is published.
        debug!(
            in_flight_polls = polls.len(),
            in_flight_lookups = lookups.len(),
            last_tick = self.last_issued_tick,
            "Tracking loop exited, discarding in-flight requests"
        );
    }

    fn begin_observer(&mut self, lookups: &mut FuturesUnordered<LookupFuture>) {
        self.publish(SnapshotUpdate::ObserverChanged(self.observer));

        let generation = self.generation;
        let observer = self.observer;

        let geocode = Arc::clone(&self.sources.geocode);
        lookups.push(Box::pin(async move {
            (generation, LookupOutcome::Place(geocode.try_resolve(observer).await))
        }));

        let pass = Arc::clone(&self.sources.pass);
        lookups.push(Box::pin(async move {
            (generation, LookupOutcome::Pass(pass.next_pass(observer).await))
        }));
    }

    fn change_observer(
        &mut self,
        observer: Coordinate,
        lookups: &mut FuturesUnordered<LookupFuture>,
    ) {
        if observer == self.observer {
            debug!(%observer, "Observer unchanged, keeping current lookups");
            return;
        }

        info!(from = %self.observer, to = %observer, "Observer changed, refreshing lookups");
        self.observer = observer;
        self.generation += 1;
        self.begin_observer(lookups);
    }

    fn issue_poll(&mut self) -> PollFuture {
        self.last_issued_tick += 1;
        let tick = self.last_issued_tick;
        debug!(tick, "Polling position");

        let source = Arc::clone(&self.sources.position);
        Box::pin(async move { (tick, source.poll().await) })
    }

    fn apply_poll(&mut self, tick: u64, result: Result<PositionSample, SourceError>) {
        if tick <= self.last_applied_tick {
            debug!(
                tick,
                last_applied = self.last_applied_tick,
                "Dropping out-of-order poll response"
            );
            return;
        }
        self.last_applied_tick = tick;

        match result {
            Ok(sample) => self.publish(SnapshotUpdate::PositionObserved(sample)),
            Err(e) => {
                warn!(tick, error = %e, "Position poll failed, keeping last known position");
                self.publish(SnapshotUpdate::PositionFailed(e.to_string()));
            }
        }
    }

    fn apply_lookup(&mut self, generation: u64, outcome: LookupOutcome) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "Dropping lookup for a previous observer"
            );
            return;
        }

        let update = match outcome {
            LookupOutcome::Place(Ok(place)) => SnapshotUpdate::PlaceResolved(place),
            LookupOutcome::Place(Err(e)) => SnapshotUpdate::PlaceFailed(e.to_string()),
            LookupOutcome::Pass(Ok(pass)) => SnapshotUpdate::PassPredicted(pass),
            LookupOutcome::Pass(Err(e)) if !e.is_failure() => {
                info!(observer = %self.observer, "No upcoming pass scheduled");
                SnapshotUpdate::NoUpcomingPass
            }
            LookupOutcome::Pass(Err(e)) => {
                warn!(observer = %self.observer, error = %e, "Pass prediction failed");
                SnapshotUpdate::PassFailed(e.to_string())
            }
        };
        self.publish(update);
    }

    fn publish(&mut self, update: SnapshotUpdate) {
        if self.cancel.is_cancelled() {
            return;
        }

        let next = Arc::new(self.current.merge(update, &self.config.merge_policy));
        self.current = Arc::clone(&next);
        self.snapshot_tx.send_replace(Arc::clone(&next));

        // A sink may stop tracking; later sinks must not see this snapshot.
        // On a multi-threaded runtime a stop() racing this loop can still
        // be followed by the one sink call already past this check.
        for sink in &self.sinks {
            if self.cancel.is_cancelled() {
                debug!(revision = next.revision, "Stopped while publishing, skipping sinks");
                return;
            }
            sink.on_snapshot(Arc::clone(&next));
        }
    }
}
