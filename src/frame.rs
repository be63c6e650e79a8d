//! RGB frame buffer shared by the capture source, the filters and the output sink.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb, RgbImage};

/// Bytes per pixel (packed RGB8).
pub const CHANNELS: usize = 3;

/// Errors raised when building a frame from raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame buffer holds {actual} bytes, {width}x{height} RGB needs {expected}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A single video frame in packed RGB8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Frame {
    /// Wrap raw RGB bytes, checking the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// A frame where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// True when the frame has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride() + x as usize * CHANNELS
    }

    /// Read the pixel at (x, y). Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Overwrite the pixel at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// Bilinear resample to an exact size.
    ///
    /// A zero target dimension yields an empty frame of that size rather than an error,
    /// callers treat it as degenerate geometry.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if width == 0 || height == 0 || self.is_empty() {
            return Frame {
                data: Vec::new(),
                width,
                height,
            };
        }
        if width == self.width && height == self.height {
            return self.clone();
        }
        let view: ImageBuffer<Rgb<u8>, &[u8]> =
            match ImageBuffer::from_raw(self.width, self.height, self.data.as_slice()) {
                Some(view) => view,
                None => {
                    return Frame {
                        data: Vec::new(),
                        width: 0,
                        height: 0,
                    }
                }
            };
        Frame::from_image(imageops::resize(&view, width, height, FilterType::Triangle))
    }

    /// Resample by a uniform factor, rounding the target size to whole pixels.
    pub fn scaled(&self, factor: f64) -> Frame {
        let factor = factor.max(0.0);
        let width = (self.width as f64 * factor).round() as u32;
        let height = (self.height as f64 * factor).round() as u32;
        self.resized(width, height)
    }

    /// Convert into an `image` buffer (for encoding). `None` if the buffer is inconsistent.
    pub fn into_image(self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data)
    }

    /// Take ownership of an `image` buffer.
    pub fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
        }
    }
}

/// Mirror a frame horizontally (flip left-right).
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let stride = frame.stride();

    for row in frame.data.chunks_exact_mut(stride.max(1)) {
        for x in 0..width / 2 {
            let left = x * CHANNELS;
            let right = (width - 1 - x) * CHANNELS;
            for i in 0..CHANNELS {
                row.swap(left + i, right + i);
            }
        }
    }
}
