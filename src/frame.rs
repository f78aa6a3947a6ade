//! Single-channel luminance frames.

use crate::error::{CurioError, Result};

/// An immutable W×H luminance image, row-major (`y * width + x`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wrap row-major luminance samples.
    ///
    /// Fails when either dimension is zero or `pixels.len() != width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = width * height;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(CurioError::InvalidFrame {
                width,
                height,
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Result<Self> {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::new(width, height, pixels)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Luminance at `(x, y)`. Panics when out of bounds.
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Raw row-major samples.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
