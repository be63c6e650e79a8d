//! Bounded collection of live snapshots for one stream.

use std::collections::VecDeque;

use super::composite::composite_centered;
use super::snapshot::{Snapshot, SnapshotSettings};
use crate::frame::Frame;

/// Spawns, advances, composites and retires snapshots.
///
/// Snapshots are kept in creation order. When full, the oldest is evicted before a
/// new one is appended, and compositing walks the list front to back so the newest
/// overlay ends up on top.
#[derive(Debug)]
pub struct SnapshotEngine {
    snapshots: VecDeque<Snapshot>,
    settings: SnapshotSettings,
    ticks_since_spawn: Option<u32>,
}

impl SnapshotEngine {
    pub fn new(settings: SnapshotSettings) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(settings.max_snapshots),
            settings,
            ticks_since_spawn: None,
        }
    }

    pub fn settings(&self) -> &SnapshotSettings {
        &self.settings
    }

    /// Live snapshots, oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop every live snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.ticks_since_spawn = None;
    }

    /// Spawn a snapshot of `frame` if the trigger is active this tick.
    ///
    /// While the trigger stays held, spawns are spaced `spawn_interval` ticks apart.
    /// Returns whether a snapshot was spawned.
    pub fn maybe_spawn(&mut self, frame: &Frame, trigger_active: bool) -> bool {
        if !trigger_active {
            self.ticks_since_spawn = None;
            return false;
        }
        if let Some(ticks) = self.ticks_since_spawn.as_mut() {
            *ticks += 1;
            if *ticks < self.settings.spawn_interval {
                return false;
            }
        }
        self.spawn(frame)
    }

    /// Unconditionally spawn, evicting the oldest snapshot when at capacity.
    pub fn spawn(&mut self, frame: &Frame) -> bool {
        self.ticks_since_spawn = Some(0);
        if self.settings.max_snapshots == 0 {
            return false;
        }
        while self.snapshots.len() >= self.settings.max_snapshots {
            self.snapshots.pop_front();
            log::trace!("snapshot capacity {} reached, evicted oldest", self.settings.max_snapshots);
        }
        self.snapshots.push_back(Snapshot::new(frame, &self.settings));
        log::debug!("spawned snapshot ({} live)", self.snapshots.len());
        true
    }

    /// Advance every snapshot one tick, retire the expired ones and composite the
    /// survivors onto a copy of `frame`.
    pub fn tick(&mut self, frame: &Frame) -> Frame {
        if self.snapshots.is_empty() {
            return frame.clone();
        }

        self.snapshots.retain_mut(|snapshot| snapshot.update(frame));

        let mut output = frame.clone();
        for snapshot in &self.snapshots {
            // Degenerate geometry is skipped inside, not reported.
            composite_centered(&mut output, snapshot.captured_image(), snapshot.opacity());
        }
        output
    }
}
