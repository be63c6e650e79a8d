//! Stateless per-pixel filters.

use crate::frame::{mirror_horizontal, Frame};
use crate::registry::{FilterContext, FilterError};

/// Mirror the frame left-right.
pub fn horizontal_flip(frame: &Frame, _ctx: &mut FilterContext<'_>) -> Result<Frame, FilterError> {
    let mut flipped = frame.clone();
    mirror_horizontal(&mut flipped);
    Ok(flipped)
}

/// Posterize: snap every channel down to a multiple of `color_levels` (default 64).
pub fn minimize_colors(frame: &Frame, ctx: &mut FilterContext<'_>) -> Result<Frame, FilterError> {
    let levels = ctx.params().u32("color_levels", 64);
    if levels == 0 {
        return Err(FilterError::InvalidParameter {
            key: "color_levels".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let data = frame
        .data
        .iter()
        .map(|&v| ((v as u32 / levels) * levels) as u8)
        .collect();
    Ok(Frame {
        data,
        width: frame.width,
        height: frame.height,
    })
}
