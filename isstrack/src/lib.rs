//! isstrack - Live International Space Station tracking
//!
//! This library polls the station's position, resolves the observer's place
//! name, predicts the next visible pass, and merges all three streams into a
//! single immutable [`snapshot::Snapshot`] that drives a map view.
//!
//! # Architecture
//!
//! ```text
//! PositionSource ──┐ (every 5s, tick-tagged)
//! GeocodeResolver ─┼──► Aggregator ──► Snapshot ──► SnapshotSink (ViewSync, UI)
//! PassPredictor ───┘ (once per observer)
//! ```

pub mod aggregator;
pub mod config;
pub mod coord;
pub mod geocode;
pub mod logging;
pub mod pass;
pub mod position;
pub mod presentation;
pub mod provider;
pub mod snapshot;
pub mod view_sync;

/// Library version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
