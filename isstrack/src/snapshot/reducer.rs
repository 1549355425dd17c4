//! Pure merge of one partial result into a snapshot.

use super::{FaultSeverity, PassStatus, Snapshot, SourceFault, SourceKind};
use crate::coord::Coordinate;
use crate::geocode::PlaceName;
use crate::pass::PassWindow;
use crate::position::PositionSample;

/// Consecutive position failures before the fault turns persistent.
pub const DEFAULT_PERSISTENT_FAILURE_THRESHOLD: u32 = 3;

/// Tunables for [`Snapshot::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// Consecutive failures at which a fault becomes [`FaultSeverity::Persistent`].
    pub persistent_failure_threshold: u32,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            persistent_failure_threshold: DEFAULT_PERSISTENT_FAILURE_THRESHOLD,
        }
    }
}

impl MergePolicy {
    fn severity_for(&self, consecutive_failures: u32) -> FaultSeverity {
        if consecutive_failures >= self.persistent_failure_threshold.max(1) {
            FaultSeverity::Persistent
        } else {
            FaultSeverity::Transient
        }
    }
}

/// One partial result to fold into the current snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotUpdate {
    /// The observer moved; place and pass for the old observer are stale.
    ObserverChanged(Coordinate),
    /// A poll tick succeeded.
    PositionObserved(PositionSample),
    /// A poll tick failed with the given message.
    PositionFailed(String),
    /// The observer's place name resolved.
    PlaceResolved(PlaceName),
    /// Reverse geocoding failed; the default name is shown.
    PlaceFailed(String),
    /// A pass window was predicted.
    PassPredicted(PassWindow),
    /// The pass provider has nothing scheduled.
    NoUpcomingPass,
    /// The pass lookup failed with the given message.
    PassFailed(String),
}

impl Snapshot {
    /// Fold `update` into this snapshot, producing the next one.
    ///
    /// Every field the update does not concern is copied unchanged.
    pub fn merge(&self, update: SnapshotUpdate, policy: &MergePolicy) -> Snapshot {
        let mut next = self.clone();
        next.revision = self.revision + 1;

        match update {
            SnapshotUpdate::ObserverChanged(observer) => {
                next.observer = Some(observer);
                next.place = PlaceName::default();
                next.pass = None;
                next.pass_status = PassStatus::Pending;
                next.errors.remove(&SourceKind::Pass);
                next.errors.remove(&SourceKind::Geocode);
            }
            SnapshotUpdate::PositionObserved(sample) => {
                next.position = Some(sample);
                next.errors.remove(&SourceKind::Position);
            }
            SnapshotUpdate::PositionFailed(message) => {
                next.raise(SourceKind::Position, message, policy);
            }
            SnapshotUpdate::PlaceResolved(place) => {
                next.place = place;
                next.errors.remove(&SourceKind::Geocode);
            }
            SnapshotUpdate::PlaceFailed(message) => {
                next.place = PlaceName::default();
                next.raise(SourceKind::Geocode, message, policy);
            }
            SnapshotUpdate::PassPredicted(pass) => {
                next.pass = Some(pass);
                next.pass_status = PassStatus::Scheduled;
                next.errors.remove(&SourceKind::Pass);
            }
            SnapshotUpdate::NoUpcomingPass => {
                next.pass = None;
                next.pass_status = PassStatus::NoneScheduled;
                next.errors.remove(&SourceKind::Pass);
            }
            SnapshotUpdate::PassFailed(message) => {
                if next.pass.is_none() {
                    next.pass_status = PassStatus::Unavailable;
                }
                next.raise(SourceKind::Pass, message, policy);
            }
        }

        next
    }

    fn raise(&mut self, source: SourceKind, message: String, policy: &MergePolicy) {
        let consecutive_failures = self
            .errors
            .get(&source)
            .map_or(1, |fault| fault.consecutive_failures.saturating_add(1));

        self.errors.insert(
            source,
            SourceFault {
                source,
                message,
                consecutive_failures,
                severity: policy.severity_for(consecutive_failures),
            },
        );
    }
}
