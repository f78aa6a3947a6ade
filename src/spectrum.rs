/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Temporal frame buffer and its (time, x, y) frequency transform.
//!
//! # Layout
//!
//! Both the [`TemporalBuffer`] and the [`FrequencyField`] store `depth × width
//! × height` complex samples in `(depth, x, y)` order, `y` fastest:
//!
//! ```text
//! index(d, x, y) = (d × width + x) × height + y
//! ```
//!
//! # Invariants
//!
//! - Plane 0 holds the most recently ingested frame; plane `d` holds the frame
//!   ingested `d` steps earlier. Ingesting shifts every plane down by one and
//!   drops the oldest before overwriting plane 0.
//! - Samples enter the buffer with zero imaginary part and amplitude in [0, 1].
//! - The frequency field is recomputed in full on every transform.

use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::error::{CurioError, Result};
use crate::frame::Frame;

/// Default number of frames in the temporal buffer.
pub const FFT_DEPTH: usize = 8;

/// Full-scale luminance value.
const LUMA_MAX: f64 = 255.0;

// ─── Temporal Buffer ────────────────────────────────────────────────────────

/// Fixed-depth FIFO of complex luminance planes.
#[derive(Clone, Debug)]
pub struct TemporalBuffer {
    depth: usize,
    width: usize,
    height: usize,
    samples: Vec<Complex64>,
}

impl TemporalBuffer {
    /// Zero-filled buffer of `depth` planes, each `width × height`.
    pub fn new(depth: usize, width: usize, height: usize) -> Self {
        Self {
            depth,
            width,
            height,
            samples: vec![Complex64::new(0.0, 0.0); depth * width * height],
        }
    }

    /// Number of planes.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `(width, height)` of every plane.
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// Flat index of `(d, x, y)`.
    pub fn index(&self, d: usize, x: usize, y: usize) -> usize {
        (d * self.width + x) * self.height + y
    }

    /// Sample at `(d, x, y)`.
    pub fn value(&self, d: usize, x: usize, y: usize) -> Complex64 {
        self.samples[self.index(d, x, y)]
    }

    /// Plane `d` in `(x, y)` order.
    pub fn plane(&self, d: usize) -> &[Complex64] {
        let len = self.plane_len();
        &self.samples[d * len..(d + 1) * len]
    }

    /// All samples in `(depth, x, y)` order.
    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }

    /// Shift the buffer and store `frame` as plane 0.
    pub fn ingest(&mut self, frame: &Frame) -> Result<()> {
        self.ingest_with(frame, f64::from)
    }

    /// Shift the buffer and store `frame` as plane 0, passing every luminance
    /// sample through `sample` first. The result is clamped to [0, 255]
    /// before normalisation.
    pub fn ingest_with(&mut self, frame: &Frame, mut sample: impl FnMut(u8) -> f64) -> Result<()> {
        if frame.dims() != self.dims() {
            return Err(CurioError::FrameSizeMismatch {
                expected: self.dims(),
                got: frame.dims(),
            });
        }
        let len = self.plane_len();
        if self.depth > 1 {
            self.samples.copy_within(0..(self.depth - 1) * len, len);
        }
        for x in 0..self.width {
            for y in 0..self.height {
                let g = sample(frame.luma(x, y)).clamp(0.0, LUMA_MAX);
                self.samples[x * self.height + y] = Complex64::new(g / LUMA_MAX, 0.0);
            }
        }
        Ok(())
    }
}

// ─── Frequency Field ────────────────────────────────────────────────────────

/// Complex spectrum of a [`TemporalBuffer`], same layout as the buffer.
#[derive(Clone, Debug)]
pub struct FrequencyField {
    depth: usize,
    width: usize,
    height: usize,
    bins: Vec<Complex64>,
}

impl FrequencyField {
    /// `(depth, width, height)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.depth, self.width, self.height)
    }

    /// Number of frequency bins (`depth × width × height`).
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True when the field has no bins.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// All bins in `(depth, x, y)` order.
    pub fn bins(&self) -> &[Complex64] {
        &self.bins
    }

    /// Bin magnitudes in `(depth, x, y)` order.
    pub fn magnitudes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bins.iter().map(|c| c.norm())
    }

    /// Sum of all bin magnitudes.
    pub fn magnitude_sum(&self) -> f64 {
        self.magnitudes().sum()
    }

    /// Bin phases shifted into [0, 2π], in `(depth, x, y)` order.
    pub fn shifted_phases(&self) -> impl Iterator<Item = f64> + '_ {
        self.bins
            .iter()
            .map(|c| c.arg() + std::f64::consts::PI)
    }
}

// ─── Transform ──────────────────────────────────────────────────────────────

/// Separable 3-D FFT over `(depth, x, y)`, with plans cached per axis.
pub struct SpectralTransform {
    shape: (usize, usize, usize),
    depth_fft: Arc<dyn Fft<f64>>,
    x_fft: Arc<dyn Fft<f64>>,
    y_fft: Arc<dyn Fft<f64>>,
    line: Vec<Complex64>,
}

impl SpectralTransform {
    /// Plan forward transforms for a `depth × width × height` volume.
    pub fn new(depth: usize, width: usize, height: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            shape: (depth, width, height),
            depth_fft: planner.plan_fft_forward(depth),
            x_fft: planner.plan_fft_forward(width),
            y_fft: planner.plan_fft_forward(height),
            line: Vec::with_capacity(depth.max(width)),
        }
    }

    /// Transform the whole buffer into a fresh frequency field.
    pub fn transform(&mut self, buffer: &TemporalBuffer) -> FrequencyField {
        let (depth, width, height) = self.shape;
        debug_assert_eq!((buffer.depth(), buffer.dims()), (depth, (width, height)));

        let mut bins = buffer.samples().to_vec();

        // y is contiguous: rustfft processes every length-`height` chunk in one call.
        if height > 1 {
            self.y_fft.process(&mut bins);
        }
        if width > 1 {
            for d in 0..depth {
                for y in 0..height {
                    let start = d * width * height + y;
                    transform_strided(&*self.x_fft, &mut bins, &mut self.line, start, height, width);
                }
            }
        }
        if depth > 1 {
            for x in 0..width {
                for y in 0..height {
                    let start = x * height + y;
                    transform_strided(&*self.depth_fft, &mut bins, &mut self.line, start, width * height, depth);
                }
            }
        }

        FrequencyField {
            depth,
            width,
            height,
            bins,
        }
    }
}

impl core::fmt::Debug for SpectralTransform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpectralTransform")
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Gather `len` samples at `start + k × stride`, transform them, scatter back.
fn transform_strided(
    fft: &dyn Fft<f64>,
    data: &mut [Complex64],
    line: &mut Vec<Complex64>,
    start: usize,
    stride: usize,
    len: usize,
) {
    line.clear();
    line.extend((0..len).map(|k| data[start + k * stride]));
    fft.process(line);
    for (k, v) in line.iter().enumerate() {
        data[start + k * stride] = *v;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
