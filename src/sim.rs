/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Camera-free simulation harness.
//!
//! A small grayscale grid stands in for the camera. Every iteration the grid
//! is sensed with a compression sensor, three Markov minds choose a cell
//! column, a cell row and an intensity change, and the chosen cell is
//! updated. The minds are therefore rewarded for making the grid's spectrum
//! harder to compress.
//!
//! ```text
//! grid ─► Frame ─► SpectralSensor ─► novelty ─┬─► mind_x ─► x
//!  ▲                                          ├─► mind_y ─► y
//!  └──────── grid[x, y] += delta ◄────────────┴─► mind_delta ─► delta
//! ```
//!
//! # Invariants
//!
//! - One seeded [`StdRng`] feeds the initial grid and every mind, so a seed
//!   fully determines the run: same seed, bit-identical frames.
//! - Exactly one frame is recorded per iteration, after the update.
//! - Cell values saturate at 0 and 255.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CurioError, Result};
use crate::frame::Frame;
use crate::policy::{MarkovMind, MarkovUpdate};
use crate::sensor::{CompressionReducer, SensorConfig, SpectralSensor};
use crate::spectrum::FFT_DEPTH;

/// Intensity changes the delta mind chooses between.
pub const INTENSITY_DELTAS: [i16; 3] = [-128, 0, 128];

/// Simulation configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// RNG seed. Default 1.
    pub seed: u64,
    /// Grid width in cells. Default 16.
    pub width: usize,
    /// Grid height in cells. Default 16.
    pub height: usize,
    /// Number of iterations (and recorded frames). Default 1024.
    pub iterations: usize,
    /// Temporal depth of the sensor. Default [`FFT_DEPTH`].
    pub depth: usize,
    /// Reinforcement rule of the three minds.
    pub update: MarkovUpdate,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            width: 16,
            height: 16,
            iterations: 1024,
            depth: FFT_DEPTH,
            update: MarkovUpdate::Complement,
        }
    }
}

impl SimConfig {
    /// Check ranges. Dimensions must fit a GIF (≤ 65535) and a byte-sized
    /// action index (≤ 256).
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > 256 {
                return Err(CurioError::InvalidConfig(format!(
                    "grid {} must be in 1..=256, got {}",
                    name, value
                )));
            }
        }
        if self.depth == 0 {
            return Err(CurioError::InvalidConfig("sensor depth must be at least 1".into()));
        }
        Ok(())
    }
}

/// What happened in one iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimStep {
    /// Novelty score of the grid before the update.
    pub novelty: f64,
    /// Column of the updated cell.
    pub x: usize,
    /// Row of the updated cell.
    pub y: usize,
    /// Intensity change applied (before saturation).
    pub delta: i16,
}

// ─── Simulation ─────────────────────────────────────────────────────────────

/// A grid world driven by three Markov minds.
#[derive(Debug)]
pub struct Simulation {
    width: usize,
    height: usize,
    grid: Vec<u8>,
    rng: StdRng,
    sensor: SpectralSensor<CompressionReducer>,
    mind_x: MarkovMind<3>,
    mind_y: MarkovMind<3>,
    mind_delta: MarkovMind<3>,
}

impl Simulation {
    /// Seed the grid: each cell is black with probability 1/3, else white.
    pub fn new(config: &SimConfig) -> Result<Self> {
        config.validate()?;
        let (width, height) = (config.width, config.height);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut grid = vec![0u8; width * height];
        for x in 0..width {
            for y in 0..height {
                grid[y * width + x] = if rng.gen_range(0..3) == 0 { 0 } else { 255 };
            }
        }
        let sensor_config = SensorConfig {
            depth: config.depth,
            ..SensorConfig::default()
        };
        Ok(Self {
            width,
            height,
            grid,
            rng,
            sensor: SpectralSensor::with_config(CompressionReducer::new(), &sensor_config)?,
            mind_x: MarkovMind::new(width).with_update(config.update),
            mind_y: MarkovMind::new(height).with_update(config.update),
            mind_delta: MarkovMind::new(INTENSITY_DELTAS.len()).with_update(config.update),
        })
    }

    /// The grid as a frame.
    pub fn frame(&self) -> Result<Frame> {
        Frame::new(self.width, self.height, self.grid.clone())
    }

    /// Sense, decide and update one cell.
    pub fn step(&mut self) -> Result<SimStep> {
        let novelty = self.sensor.sense(&self.frame()?)?;
        let x = self.mind_x.step(&mut self.rng, novelty);
        let y = self.mind_y.step(&mut self.rng, novelty);
        let delta = INTENSITY_DELTAS[self.mind_delta.step(&mut self.rng, novelty)];

        let cell = &mut self.grid[y * self.width + x];
        *cell = (i16::from(*cell) + delta).clamp(0, 255) as u8;
        Ok(SimStep { novelty, x, y, delta })
    }
}

/// Run a full simulation and record every frame.
pub fn run(config: &SimConfig) -> Result<SimulationRun> {
    let mut sim = Simulation::new(config)?;
    let initial = sim.frame()?;
    let mut frames = Vec::with_capacity(config.iterations);
    let mut steps = Vec::with_capacity(config.iterations);
    for _ in 0..config.iterations {
        steps.push(sim.step()?);
        frames.push(sim.frame()?);
    }
    log::info!(
        "simulation: seed {} ran {} iterations on a {}x{} grid",
        config.seed,
        config.iterations,
        config.width,
        config.height
    );
    Ok(SimulationRun {
        initial,
        frames,
        steps,
    })
}

// ─── Recorded run ───────────────────────────────────────────────────────────

/// Frames and decisions of a finished simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationRun {
    initial: Frame,
    frames: Vec<Frame>,
    steps: Vec<SimStep>,
}

impl SimulationRun {
    /// Grid before the first iteration.
    pub fn initial(&self) -> &Frame {
        &self.initial
    }

    /// One frame per iteration, in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// One record per iteration, in order.
    pub fn steps(&self) -> &[SimStep] {
        &self.steps
    }

    /// Grid after the last iteration.
    pub fn final_grid(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.initial)
    }

    /// Encode the frames as a looping grayscale GIF.
    pub fn write_gif<W: Write>(&self, writer: W) -> Result<()> {
        let (width, height) = self.initial.dims();
        let palette: Vec<u8> = (0..=255u8).flat_map(|g| [g, g, g]).collect();
        let mut encoder = gif::Encoder::new(writer, width as u16, height as u16, &palette)?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        for frame in &self.frames {
            let mut gif_frame = gif::Frame::default();
            gif_frame.width = width as u16;
            gif_frame.height = height as u16;
            gif_frame.buffer = Cow::Borrowed(frame.pixels());
            encoder.write_frame(&gif_frame)?;
        }
        // Dropping the encoder would swallow a failed trailer write.
        let mut writer = encoder.into_inner()?;
        writer.flush()?;
        Ok(())
    }

    /// Write the GIF to `path`.
    pub fn save_gif(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_gif(BufWriter::new(file))?;
        log::info!("wrote {} frames to {}", self.frames.len(), path.display());
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
