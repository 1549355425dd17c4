//! Terminal stand-ins for the map view: a camera that animates in the log and
//! a sink that prints each snapshot.

use std::sync::Arc;

use chrono::Local;
use isstrack::coord::Coordinate;
use isstrack::presentation::{error_lines, format_hemisphere, pass_line, position_line};
use isstrack::snapshot::Snapshot;
use isstrack::view_sync::{AnimationOutcome, CameraAnimation, CameraDriver, CameraInstruction};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Animates camera moves on the runtime and reports where the camera lands.
pub struct ConsoleCamera {
    runtime: Handle,
    position: Arc<Mutex<Coordinate>>,
}

impl ConsoleCamera {
    pub fn new(runtime: Handle, initial: Coordinate) -> Self {
        Self {
            runtime,
            position: Arc::new(Mutex::new(initial)),
        }
    }
}

impl CameraDriver for ConsoleCamera {
    fn fly_to(&self, instruction: CameraInstruction) {
        let from = *self.position.lock();
        let position = Arc::clone(&self.position);
        let id = instruction.id;
        let zoom = instruction.zoom;

        self.runtime.spawn(async move {
            let frames = Arc::clone(&position);
            let outcome = CameraAnimation::new(instruction, from)
                .run(move |frame| *frames.lock() = frame)
                .await;

            match outcome {
                AnimationOutcome::Completed => {
                    let at = *position.lock();
                    println!("  camera  -> {} (zoom {})", format_hemisphere(at), zoom);
                }
                AnimationOutcome::Superseded => debug!(id, "Camera move superseded"),
            }
        });
    }
}

/// Prints a block for every snapshot that changes what the user sees.
#[derive(Default)]
pub struct SnapshotPrinter {
    last: Mutex<Option<Arc<Snapshot>>>,
}

impl SnapshotPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(&self, snapshot: &Snapshot) {
        println!("[{}]", Local::now().format("%H:%M:%S"));
        println!("  ISS     {}", position_line(snapshot));
        println!("  from    {}", snapshot.place);
        println!("  pass    {}", pass_line(snapshot));
        for line in error_lines(snapshot) {
            warn!("{}", line);
        }
    }
}

impl isstrack::aggregator::SnapshotSink for SnapshotPrinter {
    fn on_snapshot(&self, snapshot: Arc<Snapshot>) {
        let mut last = self.last.lock();
        let unchanged = last.as_deref().is_some_and(|previous| {
            previous.position == snapshot.position
                && previous.place == snapshot.place
                && previous.pass == snapshot.pass
                && previous.pass_status == snapshot.pass_status
                && previous.errors == snapshot.errors
        });
        if !unchanged {
            self.print(&snapshot);
        }
        *last = Some(snapshot);
    }
}
