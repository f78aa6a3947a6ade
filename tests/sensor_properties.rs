//! Integration tests for the novelty sensor and the complexity estimator.

use curio_core::complexity::{estimate, ComplexityEstimator, DeflateEstimator};
use curio_core::sensor::{compression_sensor, entropy_sensor, SensorConfig, SpectralSensor};
use curio_core::spectrum::FFT_DEPTH;
use curio_core::{CurioError, Frame};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

// ─── helpers ─────────────────────────────────────────────────────────────────

fn noise_frame(rng: &mut StdRng, w: usize, h: usize) -> Frame {
    Frame::from_fn(w, h, |_, _| rng.gen()).unwrap()
}

fn gradient(w: usize, h: usize, t: usize) -> Frame {
    Frame::from_fn(w, h, |x, y| ((x + y + t) * 16 % 256) as u8).unwrap()
}

// ─── complexity ──────────────────────────────────────────────────────────────

#[test]
fn test_zero_run_is_near_minimal_and_noise_near_maximal() {
    let zeros = estimate(&[0u8; 1024]);
    let mut noise = [0u8; 1024];
    StdRng::seed_from_u64(99).fill_bytes(&mut noise);
    let random = estimate(&noise);
    assert!(zeros >= 0.0 && zeros < 10.0, "zeros={}", zeros);
    assert!(random > 240.0, "random={}", random);
    assert!(random > zeros);
}

#[test]
fn test_tiny_input_may_exceed_full_scale() {
    // DEFLATE framing costs more than one byte.
    let score = DeflateEstimator::new().estimate(&[42]);
    assert!(score > 255.0, "score={}", score);
}

// ─── entropy sensor ──────────────────────────────────────────────────────────

#[test]
fn test_entropy_bound_holds_for_many_sizes() {
    let mut rng = StdRng::seed_from_u64(1);
    for (w, h) in [(1, 1), (2, 3), (5, 5), (16, 9)] {
        let mut sensor = entropy_sensor();
        let bound = ((FFT_DEPTH * w * h) as f64).log2();
        for _ in 0..(FFT_DEPTH + 2) {
            let score = sensor.sense(&noise_frame(&mut rng, w, h)).unwrap();
            assert!(score.is_finite(), "{}x{} score={}", w, h, score);
            assert!(score >= 0.0 && score <= bound + 1e-9, "{}x{} score={} bound={}", w, h, score, bound);
        }
    }
}

#[test]
fn test_moving_scene_beats_static_scene() {
    let mut moving = entropy_sensor();
    let mut still = entropy_sensor();
    let mut last = (0.0, 0.0);
    for t in 0..FFT_DEPTH * 2 {
        last = (
            moving.sense(&gradient(8, 8, t * 3)).unwrap(),
            still.sense(&gradient(8, 8, 0)).unwrap(),
        );
    }
    assert!(last.0 > last.1, "moving={} still={}", last.0, last.1);
}

// ─── compression sensor ──────────────────────────────────────────────────────

#[test]
fn test_compression_noise_beats_constant() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut noisy = compression_sensor(false);
    let mut flat = compression_sensor(false);
    // Small frames keep every quantised bin above zero.
    let grey = Frame::new(4, 4, vec![90; 16]).unwrap();
    let mut scores = (0.0, 0.0);
    for _ in 0..FFT_DEPTH {
        scores = (
            noisy.sense(&noise_frame(&mut rng, 4, 4)).unwrap(),
            flat.sense(&grey).unwrap(),
        );
    }
    assert!(scores.0 > scores.1, "noise={} flat={}", scores.0, scores.1);
    assert!(scores.1 >= 0.0);
}

#[test]
fn test_phase_mode_is_finite() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut sensor = compression_sensor(true);
    for _ in 0..4 {
        let score = sensor.sense(&noise_frame(&mut rng, 6, 4)).unwrap();
        assert!(score.is_finite() && score >= 0.0, "score={}", score);
    }
}

// ─── buffer behaviour through the sensor ─────────────────────────────────────

#[test]
fn test_sensor_buffer_keeps_recency_order() {
    let config = SensorConfig {
        depth: 3,
        ..SensorConfig::default()
    };
    let mut sensor = SpectralSensor::with_config(curio_core::sensor::EntropyReducer, &config).unwrap();
    assert!(sensor.buffer().is_none());
    for g in [10u8, 20, 30, 40, 50] {
        sensor.sense(&Frame::new(2, 2, vec![g; 4]).unwrap()).unwrap();
    }
    let buffer = sensor.buffer().unwrap();
    assert_eq!(buffer.depth(), 3);
    for (d, g) in [(0, 50.0), (1, 40.0), (2, 30.0)] {
        assert!((buffer.value(d, 1, 1).re - g / 255.0).abs() < 1e-12, "plane {}", d);
    }
    assert_eq!(sensor.frames_sensed(), 5);
}

#[test]
fn test_resized_frame_is_an_error_and_sensor_survives() {
    let mut sensor = entropy_sensor();
    sensor.sense(&Frame::new(4, 4, vec![1; 16]).unwrap()).unwrap();
    let err = sensor.sense(&Frame::new(4, 2, vec![1; 8]).unwrap()).unwrap_err();
    assert!(matches!(err, CurioError::FrameSizeMismatch { expected: (4, 4), got: (4, 2) }));
    assert!(sensor.sense(&Frame::new(4, 4, vec![2; 16]).unwrap()).is_ok());
}
