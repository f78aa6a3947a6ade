//! Compression-based Kolmogorov complexity estimate.
//!
//! The complexity of a byte sequence is approximated by how well a lossless
//! compressor shrinks it:
//!
//! ```text
//! ratio = 255 × compressed_len(bytes) / bytes.len()
//! ```
//!
//! A run of identical bytes scores near zero, uniformly random bytes score
//! near (and for short inputs slightly above) 255. The ratio is not clamped.
//!
//! # Invariants
//!
//! - Every call runs a fresh compressor pass over the full input; no state is
//!   carried between calls, so `estimate` is a pure function of its input.
//! - Empty input scores 0.0.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

/// Scale of the complexity ratio: a score of `COMPLEXITY_SCALE` means the
/// compressor could not shrink the input at all.
pub const COMPLEXITY_SCALE: f64 = 255.0;

/// Approximate Kolmogorov complexity of a byte sequence.
///
/// Implementors supply the compressed length; the ratio is derived from it.
pub trait ComplexityEstimator {
    /// Length in bytes of `bytes` after compression.
    fn compressed_len(&self, bytes: &[u8]) -> usize;

    /// Complexity ratio `255 × compressed_len / raw_len`.
    fn estimate(&self, bytes: &[u8]) -> f64 {
        if bytes.is_empty() {
            return 0.0;
        }
        COMPLEXITY_SCALE * self.compressed_len(bytes) as f64 / bytes.len() as f64
    }
}

/// DEFLATE-backed estimator (raw deflate stream, no zlib framing).
#[derive(Clone, Copy, Debug)]
pub struct DeflateEstimator {
    level: Compression,
}

impl DeflateEstimator {
    /// Estimator at the strongest compression level.
    pub fn new() -> Self {
        Self::with_level(9)
    }

    /// Estimator at a specific DEFLATE level, clamped to `0..=9`.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    /// The configured compression level.
    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Default for DeflateEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplexityEstimator for DeflateEstimator {
    fn compressed_len(&self, bytes: &[u8]) -> usize {
        let mut encoder = DeflateEncoder::new(Vec::with_capacity(bytes.len() / 2), self.level);
        // Writing into a Vec cannot fail; an incompressible length is the
        // conservative answer if it ever does.
        if encoder.write_all(bytes).is_err() {
            return bytes.len();
        }
        encoder.finish().map_or(bytes.len(), |out| out.len())
    }
}

/// Complexity ratio of `bytes` using the default [`DeflateEstimator`].
pub fn estimate(bytes: &[u8]) -> f64 {
    DeflateEstimator::new().estimate(bytes)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
