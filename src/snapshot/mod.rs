//! Zoom-in snapshot overlays.
//!
//! A [`Snapshot`] is a zoomed, fading copy of the live frame that grows for a fixed
//! number of ticks and then retires. The [`SnapshotEngine`] owns the live snapshots of
//! one stream, spawns new ones on trigger and composites them over each frame.

mod composite;
mod engine;
mod snapshot;

pub use composite::{composite_centered, Placement};
pub use engine::SnapshotEngine;
pub use snapshot::{Snapshot, SnapshotSettings, SnapshotState};
