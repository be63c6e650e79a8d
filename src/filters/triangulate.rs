//! Flat-shaded low-poly look.
//!
//! The frame is cut into a grid of cells, each cell is split along a diagonal into
//! two triangles, and every triangle is filled with the mean color of the pixels it
//! covers. Diagonals alternate in a checkerboard so the mesh doesn't read as stripes.

use crate::frame::{Frame, CHANNELS};
use crate::registry::{FilterContext, FilterError};

/// Cell edge in pixels at `triangulation_level = 1`.
const BASE_CELL_SIZE: u32 = 48;
/// Finest mesh allowed regardless of level.
const MIN_CELL_SIZE: u32 = 2;

/// Cell edge for a given level; higher levels give a finer mesh.
pub fn cell_size(level: u32) -> u32 {
    (BASE_CELL_SIZE / level.max(1)).max(MIN_CELL_SIZE)
}

/// Low-poly filter, mesh density set by `triangulation_level` (default 1).
pub fn triangulate_effect(frame: &Frame, ctx: &mut FilterContext<'_>) -> Result<Frame, FilterError> {
    let level = ctx.params().u32("triangulation_level", 1);
    if level == 0 {
        return Err(FilterError::InvalidParameter {
            key: "triangulation_level".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if frame.is_empty() {
        return Ok(frame.clone());
    }
    Ok(triangulate(frame, cell_size(level)))
}

/// Which of the two triangles of its cell a pixel belongs to.
fn triangle_of(x: u32, y: u32, cell: u32, cells_x: u32) -> usize {
    let (cx, cy) = (x / cell, y / cell);
    let (u, v) = (x % cell, y % cell);
    let upper = if (cx + cy) % 2 == 0 {
        // "\" diagonal: upper-right half
        u >= v
    } else {
        // "/" diagonal: upper-left half
        u + v < cell
    };
    ((cy * cells_x + cx) as usize) * 2 + usize::from(!upper)
}

fn triangulate(frame: &Frame, cell: u32) -> Frame {
    let cells_x = frame.width.div_ceil(cell);
    let cells_y = frame.height.div_ceil(cell);
    let triangles = (cells_x * cells_y) as usize * 2;

    let mut sums = vec![[0u64; CHANNELS]; triangles];
    let mut counts = vec![0u64; triangles];

    for y in 0..frame.height {
        for x in 0..frame.width {
            let t = triangle_of(x, y, cell, cells_x);
            let px = frame.pixel(x, y);
            for c in 0..CHANNELS {
                sums[t][c] += px[c] as u64;
            }
            counts[t] += 1;
        }
    }

    let means: Vec<[u8; 3]> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &n)| {
            if n == 0 {
                [0; 3]
            } else {
                [
                    ((sum[0] + n / 2) / n) as u8,
                    ((sum[1] + n / 2) / n) as u8,
                    ((sum[2] + n / 2) / n) as u8,
                ]
            }
        })
        .collect();

    let mut out = frame.clone();
    for y in 0..frame.height {
        for x in 0..frame.width {
            out.set_pixel(x, y, means[triangle_of(x, y, cell, cells_x)]);
        }
    }
    out
}
