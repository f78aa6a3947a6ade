//! # curio-core
//!
//! Curiosity-driven exploration for small mobile robots: watch the camera,
//! measure how surprising the scene is, and steer towards more surprise.
//!
//! ---
//!
//! ## There is no reward function. Novelty is the reward.
//!
//! Two ideas carry the whole system.
//!
//! **Surprise is incompressibility.** A scene the robot has already figured out
//! is predictable, and predictable data compresses well. The sensor keeps the
//! last few frames, takes their 3-D (time × x × y) spectrum, and scores it
//! either by the Shannon entropy of the spectrum or by how badly DEFLATE
//! compresses a quantised copy of it.
//!
//! **Act on what was surprising before.** The novelty score is fed to a small
//! online "mind" that samples an action from a softmax over learned values.
//! One mind remembers which actions followed which recent novelty symbols
//! (a Markov context table); the other searches candidate actions directly for
//! the one that makes its own state/action record least compressible.
//!
//! A human can take over at any time with the joystick.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! Camera → Frame → SpectralSensor → novelty → Policy → action → Controller → Transport
//!                       ↑                        ↑                   ↑
//!               SpectrumReducer          KMind / MarkovMind     Mode (manual/auto)
//!                       ↓
//!               ComplexityEstimator (DEFLATE)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`complexity`] | [`ComplexityEstimator`], [`DeflateEstimator`] | Compression ratio as a Kolmogorov complexity proxy |
//! | [`frame`] | [`Frame`] | Validated luminance images |
//! | [`spectrum`] | [`TemporalBuffer`], [`SpectralTransform`] | Frame history and its 3-D FFT |
//! | [`sensor`] | [`SpectralSensor`], [`SpectrumReducer`] | Frame stream → scalar novelty |
//! | [`policy`] | [`Policy`], [`KMind`], [`MarkovMind`] | Novelty → sampled action, learned online |
//! | [`action`] | [`Action`], [`StickState`] | Actions and differential wheel targets |
//! | [`control`] | [`Controller`], [`SharedState`], [`Transport`] | Three-thread robot loop with operator override |
//! | [`sim`] | [`sim::Simulation`], [`sim::SimulationRun`] | Camera-free grid world, rendered to GIF |
//! | [`config`] | [`CurioConfig`] | Every component's settings in one document |
//! | [`snapshot`] | [`snapshot::MarkovSnapshot`] | Serialisable Markov tables (requires `serde` feature) |
//!
//! ## Determinism
//!
//! Every source of randomness is a seeded [`rand::rngs::StdRng`] passed in by
//! the caller or owned by the component. A seed and an input sequence fully
//! determine the output; the simulation is bit-reproducible.
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod complexity;   // DEFLATE complexity ratio
pub mod frame;
pub mod spectrum;     // temporal buffer + 3-D FFT
pub mod sensor;       // spectrum → novelty
pub mod policy;       // KMind, MarkovMind
pub mod action;
pub mod control;      // controller, input, transport
pub mod sim;          // grid-world harness
pub mod config;
#[cfg(feature = "serde")]
pub mod snapshot;     // Markov table persistence

pub use action::{Action, StickState};
pub use complexity::{ComplexityEstimator, DeflateEstimator};
pub use config::CurioConfig;
pub use control::{Controller, Mode, SharedState, Transport};
pub use error::{CurioError, Result};
pub use frame::Frame;
pub use policy::{KMind, MarkovMind, Policy, PolicyConfig, PolicyKind};
pub use sensor::{SpectralSensor, SpectrumReducer};
pub use spectrum::{SpectralTransform, TemporalBuffer};
