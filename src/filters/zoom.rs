//! Zoom-in snapshots triggered by a held key.

use crate::frame::Frame;
use crate::registry::{FilterContext, FilterError};

/// Spawn a snapshot while the trigger key is held, then advance and draw all live ones.
///
/// Tuning (`trigger_key`, `max_snapshots`, `scale_speed`, ...) is read once when the
/// pipeline builds its [`crate::snapshot::SnapshotEngine`], not per frame.
pub fn zoom_in_effect(frame: &Frame, ctx: &mut FilterContext<'_>) -> Result<Frame, FilterError> {
    let triggered = ctx.events.is_active(&ctx.snapshots.settings().trigger_key);
    if ctx.snapshots.maybe_spawn(frame, triggered) {
        log::debug!("frame {}: snapshot spawned", ctx.frame_index);
    }
    Ok(ctx.snapshots.tick(frame))
}
