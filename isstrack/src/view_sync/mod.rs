//! Camera synchronization for the map view.
//!
//! [`ViewSync`] turns each snapshot into at most one "fly to" instruction.
//! Instructions are never queued: issuing a new one supersedes the previous
//! one, and an in-flight animation checks its [`SupersessionToken`] before
//! every frame and before completing.
//!
//! ```text
//! Snapshot ──► ViewSync ──► CameraInstruction{id, target, 2s} ──► CameraDriver
//!                  │
//!                  └── active id ◄── CameraAnimation checks is_current()
//! ```

mod animation;

pub use animation::{AnimationOutcome, CameraAnimation, DEFAULT_FRAMES};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::aggregator::SnapshotSink;
use crate::config::{ConfigFile, DEFAULT_CAMERA_ZOOM, DEFAULT_FLY_DURATION_MS};
use crate::coord::Coordinate;
use crate::snapshot::Snapshot;

/// Camera instruction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSyncConfig {
    /// Fixed fly-to duration, independent of distance.
    pub fly_duration: Duration,
    /// Map zoom level for each move.
    pub zoom: u8,
}

impl Default for ViewSyncConfig {
    fn default() -> Self {
        Self {
            fly_duration: Duration::from_millis(DEFAULT_FLY_DURATION_MS),
            zoom: DEFAULT_CAMERA_ZOOM,
        }
    }
}

impl ViewSyncConfig {
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            fly_duration: config.camera.fly_duration,
            zoom: config.camera.zoom,
        }
    }

    pub fn with_fly_duration(mut self, duration: Duration) -> Self {
        self.fly_duration = duration;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }
}

/// Identifies one instruction and reports whether it is still the active one.
#[derive(Debug, Clone)]
pub struct SupersessionToken {
    id: u64,
    active: Arc<AtomicU64>,
}

impl SupersessionToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// False once a newer instruction has been issued (or the view cancelled).
    pub fn is_current(&self) -> bool {
        self.active.load(Ordering::SeqCst) == self.id
    }
}

/// "Move the camera to `target` over `duration`."
#[derive(Debug, Clone)]
pub struct CameraInstruction {
    pub id: u64,
    pub target: Coordinate,
    pub zoom: u8,
    pub duration: Duration,
    token: SupersessionToken,
}

impl CameraInstruction {
    pub fn is_current(&self) -> bool {
        self.token.is_current()
    }

    pub fn token(&self) -> SupersessionToken {
        self.token.clone()
    }
}

/// The rendering layer's camera.
pub trait CameraDriver: Send + Sync {
    /// Start moving the camera. Must not block.
    fn fly_to(&self, instruction: CameraInstruction);
}

/// Issues camera instructions from snapshots.
pub struct ViewSync {
    driver: Arc<dyn CameraDriver>,
    config: ViewSyncConfig,
    active: Arc<AtomicU64>,
    last_target: Mutex<Option<Coordinate>>,
}

impl ViewSync {
    pub fn new(driver: Arc<dyn CameraDriver>, config: ViewSyncConfig) -> Self {
        Self {
            driver,
            config,
            active: Arc::new(AtomicU64::new(0)),
            last_target: Mutex::new(None),
        }
    }

    /// React to a snapshot. Returns the id of the issued instruction, if any.
    ///
    /// Nothing is issued when the snapshot has no position or when the
    /// position equals the last issued target.
    pub fn on_snapshot(&self, snapshot: &Snapshot) -> Option<u64> {
        let target = snapshot.position?.coordinate;

        let mut last_target = self.last_target.lock();
        if *last_target == Some(target) {
            return None;
        }

        let id = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        *last_target = Some(target);
        drop(last_target);

        debug!(id, %target, "Issuing camera move");
        self.driver.fly_to(CameraInstruction {
            id,
            target,
            zoom: self.config.zoom,
            duration: self.config.fly_duration,
            token: SupersessionToken {
                id,
                active: Arc::clone(&self.active),
            },
        });
        Some(id)
    }

    /// Id of the instruction that is currently allowed to run.
    pub fn active_instruction(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Supersede the active instruction without issuing a new one.
    pub fn cancel(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
        *self.last_target.lock() = None;
    }
}

impl SnapshotSink for ViewSync {
    fn on_snapshot(&self, snapshot: Arc<Snapshot>) {
        ViewSync::on_snapshot(self, &snapshot);
    }
}
