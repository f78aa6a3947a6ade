/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Spectral novelty sensor.
//!
//! ```text
//! Frame → TemporalBuffer (depth D) → 3-D FFT → FrequencyField → SpectrumReducer → score
//! ```
//!
//! The buffer and transform machinery is shared; how the spectrum collapses
//! into a scalar is the [`SpectrumReducer`] strategy:
//!
//! | Reducer | Score | Range |
//! |---------|-------|-------|
//! | [`EntropyReducer`] | Shannon entropy of the normalised magnitude spectrum | [0, log2(D·W·H)] |
//! | [`CompressionReducer`] | complexity ratio of the quantised spectrum | [0, ~255] |
//!
//! The two scales are not comparable; a caller picks one reducer per sensor.
//!
//! # Invariants
//!
//! - The buffer is allocated on the first [`SpectralSensor::sense`] call and
//!   sized to that frame; later frames must match it.
//! - Zero-probability bins contribute nothing to the entropy (never NaN).
//! - A frame smaller than the FFT depth (even 1×1) still yields a finite score.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::complexity::{ComplexityEstimator, DeflateEstimator};
use crate::error::{CurioError, Result};
use crate::frame::Frame;
use crate::spectrum::{FrequencyField, SpectralTransform, TemporalBuffer, FFT_DEPTH};

// ─── Reducers ───────────────────────────────────────────────────────────────

/// Strategy collapsing a frequency field into a scalar novelty score.
pub trait SpectrumReducer {
    /// Score the field.
    fn reduce(&self, field: &FrequencyField) -> f64;
}

/// Shannon entropy (bits) of the magnitude spectrum treated as a PMF.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropyReducer;

impl SpectrumReducer for EntropyReducer {
    fn reduce(&self, field: &FrequencyField) -> f64 {
        let sum = field.magnitude_sum();
        if sum <= 0.0 || !sum.is_finite() {
            return 0.0;
        }
        let entropy: f64 = field
            .magnitudes()
            .map(|m| m / sum)
            .filter(|&p| p > 0.0)
            .map(|p| -p * p.log2())
            .sum();
        entropy.max(0.0)
    }
}

/// Complexity ratio of the byte-quantised spectrum.
///
/// Each bin contributes `byte(255·|F| / Σ|F|)`; with `include_phase` it is
/// followed by `byte(255·(arg F + π) / Σ(arg F + π))`.
#[derive(Clone, Copy, Debug)]
pub struct CompressionReducer<E = DeflateEstimator> {
    estimator: E,
    include_phase: bool,
}

impl CompressionReducer<DeflateEstimator> {
    /// Magnitude-only quantisation with the default estimator.
    pub fn new() -> Self {
        Self::with_estimator(DeflateEstimator::new(), false)
    }

    /// Magnitude and phase quantisation with the default estimator.
    pub fn with_phase() -> Self {
        Self::with_estimator(DeflateEstimator::new(), true)
    }
}

impl Default for CompressionReducer<DeflateEstimator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ComplexityEstimator> CompressionReducer<E> {
    /// Reducer over an arbitrary estimator.
    pub fn with_estimator(estimator: E, include_phase: bool) -> Self {
        Self {
            estimator,
            include_phase,
        }
    }

    /// Quantised byte encoding of the field, in `(depth, x, y)` order.
    pub fn encode(&self, field: &FrequencyField) -> Vec<u8> {
        let magnitude_sum = field.magnitude_sum();
        let stride = if self.include_phase { 2 } else { 1 };
        let mut state = Vec::with_capacity(stride * field.len());
        if self.include_phase {
            let phase_sum: f64 = field.shifted_phases().sum();
            for (m, p) in field.magnitudes().zip(field.shifted_phases()) {
                state.push(quantise(m, magnitude_sum));
                state.push(quantise(p, phase_sum));
            }
        } else {
            state.extend(field.magnitudes().map(|m| quantise(m, magnitude_sum)));
        }
        state
    }
}

impl<E: ComplexityEstimator> SpectrumReducer for CompressionReducer<E> {
    fn reduce(&self, field: &FrequencyField) -> f64 {
        self.estimator.estimate(&self.encode(field))
    }
}

impl<R: SpectrumReducer + ?Sized> SpectrumReducer for Box<R> {
    fn reduce(&self, field: &FrequencyField) -> f64 {
        (**self).reduce(field)
    }
}

/// `byte(255 · value / total)`, 0 when the total vanishes.
fn quantise(value: f64, total: f64) -> u8 {
    if total <= 0.0 || !total.is_finite() {
        return 0;
    }
    // `as` saturates and maps NaN to 0.
    (255.0 * value / total) as u8
}

// ─── Config ─────────────────────────────────────────────────────────────────

/// Reducer selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReducerKind {
    /// [`EntropyReducer`].
    #[default]
    Entropy,
    /// [`CompressionReducer`] with the default estimator.
    Compression {
        /// Interleave quantised phases with the magnitudes.
        include_phase: bool,
    },
}

impl ReducerKind {
    /// Boxed reducer of this kind.
    pub fn build(self) -> Box<dyn SpectrumReducer + Send> {
        match self {
            ReducerKind::Entropy => Box::new(EntropyReducer),
            ReducerKind::Compression { include_phase: false } => Box::new(CompressionReducer::new()),
            ReducerKind::Compression { include_phase: true } => Box::new(CompressionReducer::with_phase()),
        }
    }
}

/// Sensor configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// How the spectrum is reduced to a score. Default entropy.
    pub reducer: ReducerKind,
    /// Number of frames in the temporal buffer. Default [`FFT_DEPTH`].
    pub depth: usize,
    /// Standard deviation of Gaussian pixel noise on the 0–255 scale.
    /// `None` (the default) senses the frames as captured.
    pub noise_sigma: Option<f64>,
    /// Seed of the noise generator.
    pub noise_seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            reducer: ReducerKind::Entropy,
            depth: FFT_DEPTH,
            noise_sigma: None,
            noise_seed: 1,
        }
    }
}

impl SensorConfig {
    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(CurioError::InvalidConfig("sensor depth must be at least 1".into()));
        }
        if let Some(sigma) = self.noise_sigma {
            if !(sigma.is_finite() && sigma >= 0.0) {
                return Err(CurioError::InvalidConfig(format!(
                    "noise sigma must be finite and non-negative, got {}",
                    sigma
                )));
            }
        }
        Ok(())
    }
}

// ─── Sensor ─────────────────────────────────────────────────────────────────

/// Buffer, plans and noise state; created on the first frame.
struct SensorState {
    buffer: TemporalBuffer,
    transform: SpectralTransform,
}

/// Novelty sensor over a stream of fixed-size frames.
pub struct SpectralSensor<R: SpectrumReducer> {
    reducer: R,
    depth: usize,
    noise: Option<(Normal<f64>, StdRng)>,
    state: Option<SensorState>,
    frames_sensed: u64,
    mismatch_warned: bool,
}

impl<R: SpectrumReducer> SpectralSensor<R> {
    /// Noise-free sensor with the default depth.
    pub fn new(reducer: R) -> Self {
        Self {
            reducer,
            depth: FFT_DEPTH,
            noise: None,
            state: None,
            frames_sensed: 0,
            mismatch_warned: false,
        }
    }

    /// Sensor built from a validated configuration.
    pub fn with_config(reducer: R, config: &SensorConfig) -> Result<Self> {
        config.validate()?;
        let noise = match config.noise_sigma {
            Some(sigma) => {
                let normal = Normal::new(0.0, sigma)
                    .map_err(|e| CurioError::InvalidConfig(format!("noise sigma: {}", e)))?;
                Some((normal, StdRng::seed_from_u64(config.noise_seed)))
            }
            None => None,
        };
        Ok(Self {
            reducer,
            depth: config.depth,
            noise,
            state: None,
            frames_sensed: 0,
            mismatch_warned: false,
        })
    }

    /// Temporal depth of the buffer.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Frames ingested so far.
    pub fn frames_sensed(&self) -> u64 {
        self.frames_sensed
    }

    /// The temporal buffer, once the first frame has been sensed.
    pub fn buffer(&self) -> Option<&TemporalBuffer> {
        self.state.as_ref().map(|s| &s.buffer)
    }

    /// Ingest `frame` and score the updated spectrum.
    pub fn sense(&mut self, frame: &Frame) -> Result<f64> {
        let depth = self.depth;
        let state = self.state.get_or_insert_with(|| {
            let (w, h) = frame.dims();
            log::debug!("allocating {}x{}x{} temporal buffer", depth, w, h);
            SensorState {
                buffer: TemporalBuffer::new(depth, w, h),
                transform: SpectralTransform::new(depth, w, h),
            }
        });

        let ingested = match self.noise.as_mut() {
            Some((normal, rng)) => state
                .buffer
                .ingest_with(frame, |g| f64::from(g) + normal.sample(&mut *rng)),
            None => state.buffer.ingest(frame),
        };
        if let Err(e) = ingested {
            if !self.mismatch_warned {
                log::warn!("{}; frame skipped", e);
                self.mismatch_warned = true;
            }
            return Err(e);
        }
        self.frames_sensed += 1;

        let field = state.transform.transform(&state.buffer);
        let score = self.reducer.reduce(&field);
        log::trace!("frame {} novelty {:.4}", self.frames_sensed, score);
        Ok(score)
    }
}

impl<R: SpectrumReducer> core::fmt::Debug for SpectralSensor<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpectralSensor")
            .field("depth", &self.depth)
            .field("noisy", &self.noise.is_some())
            .field("dims", &self.buffer().map(|b| b.dims()))
            .field("frames_sensed", &self.frames_sensed)
            .finish()
    }
}

/// Sensor whose reducer is chosen by `config.reducer`.
pub fn sensor_from_config(config: &SensorConfig) -> Result<SpectralSensor<Box<dyn SpectrumReducer + Send>>> {
    SpectralSensor::with_config(config.reducer.build(), config)
}

/// Entropy-mode sensor with default settings.
pub fn entropy_sensor() -> SpectralSensor<EntropyReducer> {
    SpectralSensor::new(EntropyReducer)
}

/// Compression-mode sensor with default settings.
pub fn compression_sensor(include_phase: bool) -> SpectralSensor<CompressionReducer> {
    let reducer = if include_phase {
        CompressionReducer::with_phase()
    } else {
        CompressionReducer::new()
    };
    SpectralSensor::new(reducer)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_frame(rng: &mut StdRng, w: usize, h: usize) -> Frame {
        Frame::from_fn(w, h, |_, _| rng.gen()).unwrap()
    }

    #[test]
    fn test_entropy_is_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sensor = entropy_sensor();
        let bound = ((FFT_DEPTH * 8 * 6) as f64).log2();
        for _ in 0..20 {
            let score = sensor.sense(&random_frame(&mut rng, 8, 6)).unwrap();
            assert!(score >= 0.0 && score <= bound + 1e-9, "score={}", score);
        }
    }

    #[test]
    fn test_black_scene_has_zero_entropy() {
        let mut sensor = entropy_sensor();
        let black = Frame::new(4, 4, vec![0; 16]).unwrap();
        assert_eq!(sensor.sense(&black).unwrap(), 0.0);
    }

    #[test]
    fn test_constant_scene_is_single_bin() {
        let mut sensor = entropy_sensor();
        let grey = Frame::new(4, 4, vec![128; 16]).unwrap();
        let mut score = f64::NAN;
        for _ in 0..FFT_DEPTH {
            score = sensor.sense(&grey).unwrap();
        }
        assert!(score.abs() < 1e-9, "score={}", score);
    }

    #[test]
    fn test_one_pixel_frame_is_finite() {
        for mut sensor in [compression_sensor(false), compression_sensor(true)] {
            let px = Frame::new(1, 1, vec![200]).unwrap();
            for _ in 0..3 {
                let score = sensor.sense(&px).unwrap();
                assert!(score.is_finite() && score >= 0.0, "score={}", score);
            }
        }
        let mut sensor = entropy_sensor();
        let score = sensor.sense(&Frame::new(1, 1, vec![200]).unwrap()).unwrap();
        assert!(score.is_finite());
    }

    #[test]
    fn test_phase_doubles_encoding() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut buffer = TemporalBuffer::new(2, 3, 3);
        buffer.ingest(&random_frame(&mut rng, 3, 3)).unwrap();
        let field = SpectralTransform::new(2, 3, 3).transform(&buffer);
        assert_eq!(CompressionReducer::new().encode(&field).len(), 18);
        assert_eq!(CompressionReducer::with_phase().encode(&field).len(), 36);
    }

    #[test]
    fn test_sensor_rejects_resized_frames() {
        let mut sensor = entropy_sensor();
        sensor.sense(&Frame::new(2, 2, vec![1; 4]).unwrap()).unwrap();
        assert!(sensor.sense(&Frame::new(3, 2, vec![1; 6]).unwrap()).is_err());
    }

    #[test]
    fn test_noise_is_seeded() {
        let config = SensorConfig {
            noise_sigma: Some(3.0),
            ..SensorConfig::default()
        };
        let frame = Frame::from_fn(6, 6, |x, y| (x * 40 + y) as u8).unwrap();
        let mut a = SpectralSensor::with_config(EntropyReducer, &config).unwrap();
        let mut b = SpectralSensor::with_config(EntropyReducer, &config).unwrap();
        let mut clean = entropy_sensor();
        let noisy = a.sense(&frame).unwrap();
        assert_eq!(noisy, b.sense(&frame).unwrap());
        assert_ne!(noisy, clean.sense(&frame).unwrap());
    }

    #[test]
    fn test_sensor_from_config_picks_reducer() {
        let frame = Frame::from_fn(4, 4, |x, y| (x * 60 + y * 3) as u8).unwrap();
        let mut entropy = sensor_from_config(&SensorConfig::default()).unwrap();
        let compression_config = SensorConfig {
            reducer: ReducerKind::Compression { include_phase: false },
            ..SensorConfig::default()
        };
        let mut compression = sensor_from_config(&compression_config).unwrap();
        assert_eq!(entropy.sense(&frame).unwrap(), entropy_sensor().sense(&frame).unwrap());
        assert_eq!(
            compression.sense(&frame).unwrap(),
            compression_sensor(false).sense(&frame).unwrap()
        );
    }

    #[test]
    fn test_config_validation() {
        let bad = SensorConfig {
            depth: 0,
            ..SensorConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = SensorConfig {
            noise_sigma: Some(-1.0),
            ..SensorConfig::default()
        };
        assert!(SpectralSensor::with_config(EntropyReducer, &bad).is_err());
    }
}
