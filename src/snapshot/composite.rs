//! Centered overlay compositing with clipping and alpha blending.

use crate::frame::{Frame, CHANNELS};

/// Clipped source/destination rectangles for a centered overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Top-left corner in the destination frame
    pub dst_x: usize,
    pub dst_y: usize,
    /// Top-left corner in the overlay
    pub src_x: usize,
    pub src_y: usize,
    /// Size of the visible region (same in both)
    pub width: usize,
    pub height: usize,
}

impl Placement {
    /// Center an overlay of `src_w x src_h` on a frame of `dst_w x dst_h` and clip it.
    ///
    /// Offsets use floor division so an overlay one pixel wider than the frame
    /// hangs over the left edge, not the right. Returns `None` when nothing is visible.
    pub fn centered(dst_w: u32, dst_h: u32, src_w: u32, src_h: u32) -> Option<Self> {
        let (fw, fh) = (dst_w as i64, dst_h as i64);
        let (sw, sh) = (src_w as i64, src_h as i64);

        let x = (fw - sw).div_euclid(2);
        let y = (fh - sh).div_euclid(2);

        let x_start = x.max(0);
        let y_start = y.max(0);
        let x_end = fw.min(x + sw);
        let y_end = fh.min(y + sh);

        let src_x = (-x).max(0);
        let src_y = (-y).max(0);
        let width = x_end - x_start;
        let height = y_end - y_start;

        if width <= 0 || height <= 0 || src_x + width > sw || src_y + height > sh {
            return None;
        }

        Some(Self {
            dst_x: x_start as usize,
            dst_y: y_start as usize,
            src_x: src_x as usize,
            src_y: src_y as usize,
            width: width as usize,
            height: height as usize,
        })
    }
}

/// Draw `overlay` centered on `frame` at the given opacity.
///
/// `opacity >= 1` copies the visible rows verbatim; anything lower blends
/// `src * opacity + dst * (1 - opacity)` per channel. Returns `false` when the
/// overlay was skipped (empty or inconsistent geometry, or fully transparent).
pub fn composite_centered(frame: &mut Frame, overlay: &Frame, opacity: f64) -> bool {
    if overlay.is_empty() || frame.is_empty() || opacity <= 0.0 {
        return false;
    }
    let Some(p) = Placement::centered(frame.width, frame.height, overlay.width, overlay.height)
    else {
        log::trace!(
            "skipping {}x{} overlay on {}x{} frame: no visible region",
            overlay.width,
            overlay.height,
            frame.width,
            frame.height
        );
        return false;
    };

    let dst_stride = frame.stride();
    let src_stride = overlay.stride();
    let row_bytes = p.width * CHANNELS;
    if overlay.data.len() < (p.src_y + p.height) * src_stride
        || frame.data.len() < (p.dst_y + p.height) * dst_stride
    {
        log::trace!("skipping overlay: buffer smaller than its dimensions");
        return false;
    }

    for row in 0..p.height {
        let s = (p.src_y + row) * src_stride + p.src_x * CHANNELS;
        let d = (p.dst_y + row) * dst_stride + p.dst_x * CHANNELS;
        let src = &overlay.data[s..s + row_bytes];
        let dst = &mut frame.data[d..d + row_bytes];

        if opacity >= 1.0 {
            dst.copy_from_slice(src);
        } else {
            let beta = 1.0 - opacity;
            for (d, &s) in dst.iter_mut().zip(src) {
                let blended = s as f64 * opacity + *d as f64 * beta;
                *d = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, (x + y) as u8]);
            }
        }
        Frame::new(width, height, data).unwrap()
    }

    #[test]
    fn test_placement_smaller_overlay_is_centered() {
        let p = Placement::centered(10, 8, 4, 2).unwrap();
        assert_eq!((p.dst_x, p.dst_y), (3, 3));
        assert_eq!((p.src_x, p.src_y), (0, 0));
        assert_eq!((p.width, p.height), (4, 2));
    }

    #[test]
    fn test_placement_larger_overlay_is_clipped() {
        let p = Placement::centered(10, 10, 20, 16).unwrap();
        assert_eq!((p.dst_x, p.dst_y), (0, 0));
        assert_eq!((p.src_x, p.src_y), (5, 3));
        assert_eq!((p.width, p.height), (10, 10));
    }

    #[test]
    fn test_placement_odd_overhang_uses_floor() {
        // (4 - 7) // 2 == -2
        let p = Placement::centered(4, 4, 7, 4).unwrap();
        assert_eq!(p.src_x, 2);
        assert_eq!(p.width, 4);
    }

    #[test]
    fn test_placement_empty_overlay() {
        assert!(Placement::centered(10, 10, 0, 5).is_none());
        assert!(Placement::centered(0, 0, 3, 3).is_none());
    }

    #[test]
    fn test_full_opacity_is_exact_overwrite() {
        let mut frame = Frame::filled(6, 6, [0, 0, 0]);
        let overlay = gradient(2, 2);
        assert!(composite_centered(&mut frame, &overlay, 1.0));

        for y in 0..6 {
            for x in 0..6 {
                let expected = if (2..4).contains(&x) && (2..4).contains(&y) {
                    overlay.pixel(x - 2, y - 2)
                } else {
                    [0, 0, 0]
                };
                assert_eq!(frame.pixel(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_full_opacity_larger_overlay_shows_center() {
        let mut frame = Frame::filled(4, 4, [0, 0, 0]);
        let overlay = gradient(8, 8);
        composite_centered(&mut frame, &overlay, 1.0);
        assert_eq!(frame.pixel(0, 0), overlay.pixel(2, 2));
        assert_eq!(frame.pixel(3, 3), overlay.pixel(5, 5));
    }

    #[test]
    fn test_zero_opacity_is_noop() {
        let original = gradient(5, 5);
        let mut frame = original.clone();
        let overlay = Frame::filled(5, 5, [255, 255, 255]);
        assert!(!composite_centered(&mut frame, &overlay, 0.0));
        assert_eq!(frame, original);
    }

    #[test]
    fn test_half_opacity_blends() {
        let mut frame = Frame::filled(2, 2, [100, 0, 200]);
        let overlay = Frame::filled(2, 2, [200, 100, 0]);
        composite_centered(&mut frame, &overlay, 0.5);
        assert!(frame.data.chunks(3).all(|p| p == [150, 50, 100]));
    }

    #[test]
    fn test_degenerate_overlay_skipped() {
        let original = gradient(3, 3);
        let mut frame = original.clone();
        let overlay = Frame::filled(0, 0, [1, 1, 1]);
        assert!(!composite_centered(&mut frame, &overlay, 1.0));
        assert_eq!(frame, original);
    }
}
