//! Synthetic frame source used when no camera is attached.

use crate::frame::Frame;

/// Moving color-bar test pattern.
///
/// Eight vertical bars scroll one pixel to the left per frame, with a vertical
/// brightness ramp so zoomed overlays are easy to tell apart from the base frame.
#[derive(Debug, Clone)]
pub struct TestPattern {
    width: u32,
    height: u32,
    frame: u64,
}

const BARS: [[u8; 3]; 8] = [
    [255, 255, 255],
    [255, 255, 0],
    [0, 255, 255],
    [0, 255, 0],
    [255, 0, 255],
    [255, 0, 0],
    [0, 0, 255],
    [16, 16, 16],
];

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: 0,
        }
    }

    /// Render the frame at position `index` without advancing.
    pub fn render(&self, index: u64) -> Frame {
        let mut frame = Frame::filled(self.width, self.height, [0, 0, 0]);
        let bar_width = (self.width / BARS.len() as u32).max(1) as u64;
        for y in 0..self.height {
            let ramp = 128 + (127 * y as u64 / self.height.max(1) as u64);
            for x in 0..self.width {
                let bar = ((x as u64 + index) / bar_width) as usize % BARS.len();
                let [r, g, b] = BARS[bar];
                let shade = |c: u8| (c as u64 * ramp / 255) as u8;
                frame.set_pixel(x, y, [shade(r), shade(g), shade(b)]);
            }
        }
        frame
    }
}

impl Iterator for TestPattern {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let frame = self.render(self.frame);
        self.frame += 1;
        Some(frame)
    }
}
