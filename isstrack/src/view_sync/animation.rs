//! Cooperative fly-to animation.

use std::time::Duration;

use super::CameraInstruction;
use crate::coord::Coordinate;

/// Frames per animation (10 fps over the default 2s move).
pub const DEFAULT_FRAMES: u32 = 20;

/// How an animation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// Reached the target while still the active instruction.
    Completed,
    /// A newer instruction took over; the camera was left mid-flight.
    Superseded,
}

/// Interpolates the camera from a start point to an instruction's target.
pub struct CameraAnimation {
    instruction: CameraInstruction,
    from: Coordinate,
    frames: u32,
}

impl CameraAnimation {
    pub fn new(instruction: CameraInstruction, from: Coordinate) -> Self {
        Self {
            instruction,
            from,
            frames: DEFAULT_FRAMES,
        }
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames.max(1);
        self
    }

    /// Run the animation, calling `on_frame` with each intermediate position.
    ///
    /// The supersession token is checked before every frame, so a superseded
    /// animation never emits another frame and never reports completion.
    pub async fn run<F>(self, mut on_frame: F) -> AnimationOutcome
    where
        F: FnMut(Coordinate),
    {
        let frame_interval = self.instruction.duration / self.frames;
        let target = self.instruction.target;

        for frame in 1..=self.frames {
            if !self.instruction.is_current() {
                return AnimationOutcome::Superseded;
            }
            if frame_interval > Duration::ZERO {
                tokio::time::sleep(frame_interval).await;
            }
            if !self.instruction.is_current() {
                return AnimationOutcome::Superseded;
            }
            on_frame(self.from.lerp(&target, f64::from(frame) / f64::from(self.frames)));
        }

        AnimationOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionSample;
    use crate::snapshot::{MergePolicy, Snapshot, SnapshotUpdate};
    use crate::view_sync::{CameraDriver, ViewSync, ViewSyncConfig};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingCamera {
        instructions: Mutex<Vec<CameraInstruction>>,
    }

    impl CameraDriver for RecordingCamera {
        fn fly_to(&self, instruction: CameraInstruction) {
            self.instructions.lock().push(instruction);
        }
    }

    fn snapshot_at(lat: f64, lng: f64) -> Snapshot {
        Snapshot::default().merge(
            SnapshotUpdate::PositionObserved(PositionSample::now(Coordinate::new(lat, lng).unwrap())),
            &MergePolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_completes_at_target() {
        let camera = Arc::new(RecordingCamera::default());
        let view = ViewSync::new(camera.clone(), ViewSyncConfig::default());
        view.on_snapshot(&snapshot_at(10.0, 20.0));

        let instruction = camera.instructions.lock()[0].clone();
        let origin = Coordinate::new(0.0, 0.0).unwrap();
        let mut frames = Vec::new();
        let outcome = CameraAnimation::new(instruction, origin)
            .with_frames(4)
            .run(|c| frames.push(c))
            .await;

        assert_eq!(outcome, AnimationOutcome::Completed);
        assert_eq!(frames.len(), 4);
        let last = frames.last().unwrap();
        assert!((last.lat() - 10.0).abs() < 1e-9);
        assert!((last.lng() - 20.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_animation_stops() {
        let camera = Arc::new(RecordingCamera::default());
        let view = Arc::new(ViewSync::new(camera.clone(), ViewSyncConfig::default()));
        view.on_snapshot(&snapshot_at(10.0, 20.0));

        let first = camera.instructions.lock()[0].clone();
        let frames = Arc::new(Mutex::new(0u32));
        let frames_clone = Arc::clone(&frames);
        let handle = tokio::spawn(async move {
            CameraAnimation::new(first, Coordinate::new(0.0, 0.0).unwrap())
                .with_frames(20)
                .run(move |_| *frames_clone.lock() += 1)
                .await
        });

        // Let a few frames run, then supersede mid-flight.
        tokio::time::sleep(Duration::from_millis(450)).await;
        view.on_snapshot(&snapshot_at(-10.0, -20.0));

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, AnimationOutcome::Superseded);
        let emitted = *frames.lock();
        assert!(emitted > 0 && emitted < 20, "emitted {} frames", emitted);
    }
}
