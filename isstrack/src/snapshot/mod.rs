//! The merged, point-in-time view handed to the view layer.
//!
//! A [`Snapshot`] is never mutated once published. Every change produces a new
//! snapshot via [`Snapshot::merge`], a pure function of the current snapshot
//! and one partial result:
//!
//! ```text
//! Snapshot(n) + SnapshotUpdate ──merge──► Snapshot(n+1)
//! ```
//!
//! Fields the update does not touch are copied unchanged, so data that was
//! already known is never lost. A failing source keeps its last-known-good
//! value and raises a [`SourceFault`] instead.

mod reducer;

pub use reducer::{MergePolicy, SnapshotUpdate, DEFAULT_PERSISTENT_FAILURE_THRESHOLD};

use std::collections::BTreeMap;
use std::fmt;

use crate::coord::Coordinate;
use crate::geocode::PlaceName;
use crate::pass::PassWindow;
use crate::position::PositionSample;

/// Which upstream a fault belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Position,
    Geocode,
    Pass,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Geocode => write!(f, "geocode"),
            Self::Pass => write!(f, "pass"),
        }
    }
}

/// How the UI should treat a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSeverity {
    /// A one-off blip; the next tick will likely recover.
    Transient,
    /// Repeated consecutive failures; show a sticky error state.
    Persistent,
}

/// A failure flag raised for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFault {
    pub source: SourceKind,
    pub message: String,
    pub consecutive_failures: u32,
    pub severity: FaultSeverity,
}

/// Progress of the pass lookup for the current observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassStatus {
    /// Lookup in flight (or no observer yet).
    #[default]
    Pending,
    /// A pass window is known.
    Scheduled,
    /// The provider has nothing scheduled.
    NoneScheduled,
    /// The lookup failed and no window is known.
    Unavailable,
}

/// Coarse health of the position stream, derived from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    /// No sample and no failure yet.
    Awaiting,
    /// The latest tick succeeded.
    Live,
    /// Recent ticks failed; showing the last known position.
    Degraded,
    /// Failures have persisted past the threshold.
    Lost,
}

/// Merged view of all tracked data.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Incremented on every merge.
    pub revision: u64,
    /// Observer the place name and pass belong to.
    pub observer: Option<Coordinate>,
    /// Latest applied position sample.
    pub position: Option<PositionSample>,
    /// Observer place name; default until resolved.
    pub place: PlaceName,
    /// Next pass over the observer.
    pub pass: Option<PassWindow>,
    pub pass_status: PassStatus,
    /// At most one fault per source.
    pub errors: BTreeMap<SourceKind, SourceFault>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            revision: 0,
            observer: None,
            position: None,
            place: PlaceName::default(),
            pass: None,
            pass_status: PassStatus::Pending,
            errors: BTreeMap::new(),
        }
    }
}

impl Snapshot {
    /// The fault currently raised for `source`, if any.
    pub fn error(&self, source: SourceKind) -> Option<&SourceFault> {
        self.errors.get(&source)
    }

    /// True if the position flag is raised.
    pub fn has_position_error(&self) -> bool {
        self.errors.contains_key(&SourceKind::Position)
    }

    /// True if any fault is persistent.
    pub fn has_persistent_error(&self) -> bool {
        self.errors
            .values()
            .any(|fault| fault.severity == FaultSeverity::Persistent)
    }

    pub fn position_status(&self) -> PositionStatus {
        match self.error(SourceKind::Position) {
            Some(fault) if fault.severity == FaultSeverity::Persistent => PositionStatus::Lost,
            Some(_) => PositionStatus::Degraded,
            None if self.position.is_some() => PositionStatus::Live,
            None => PositionStatus::Awaiting,
        }
    }
}
