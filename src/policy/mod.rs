/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Action-value policies ("minds").
//!
//! Every mind consumes one novelty score per step and returns a sampled action
//! index in `[0, action_count)`, updating its internal estimates online.
//!
//! | Mind | State | Update |
//! |------|-------|--------|
//! | [`KMind`] | two 1 KiB byte histories + exponential filter | compression search over candidate actions |
//! | [`MarkovMind`] | value table keyed by the last K novelty bytes | reinforce under-weighted actions |
//!
//! Minds draw all randomness from the caller's RNG, so a fixed seed and a
//! fixed novelty sequence reproduce the same action sequence.

pub mod distribution;
pub mod kmind;
pub mod markov;

pub use distribution::{normalise, sample_index, softmax};
pub use kmind::{CandidateTrials, KMind, HISTORY_SIZE};
pub use markov::{MarkovMind, MarkovUpdate};

use rand::RngCore;

use crate::action::ACTION_COUNT;
use crate::error::{CurioError, Result};

/// A swappable action-selection strategy.
pub trait Policy {
    /// Consume one novelty score and return the chosen action index.
    fn step(&mut self, rng: &mut dyn RngCore, novelty: f64) -> usize;

    /// Forget everything learned since construction.
    fn reset(&mut self);

    /// Number of actions this policy chooses between.
    fn action_count(&self) -> usize;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Quantise a novelty score into a context/history symbol: rounded to the
/// nearest integer and saturated to a byte (NaN maps to 0).
pub fn novelty_symbol(novelty: f64) -> u8 {
    novelty.round() as u8
}

/// Which mind to build.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolicyKind {
    /// Compression-search mind.
    KMind {
        /// How candidate trials treat the action history.
        trials: CandidateTrials,
    },
    /// Markov mind with a two-byte context.
    Markov2 {
        /// Reinforcement rule.
        update: MarkovUpdate,
    },
    /// Markov mind with a three-byte context.
    Markov3 {
        /// Reinforcement rule.
        update: MarkovUpdate,
    },
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Markov3 {
            update: MarkovUpdate::Complement,
        }
    }
}

/// Policy configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PolicyConfig {
    /// Strategy to build.
    pub kind: PolicyKind,
    /// Number of actions. Default [`ACTION_COUNT`] (locomotion only).
    pub action_count: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            kind: PolicyKind::default(),
            action_count: ACTION_COUNT,
        }
    }
}

impl PolicyConfig {
    /// Action indices are stored as bytes, so at most 256 actions.
    pub fn validate(&self) -> Result<()> {
        if self.action_count == 0 || self.action_count > 256 {
            return Err(CurioError::InvalidConfig(format!(
                "action count must be in 1..=256, got {}",
                self.action_count
            )));
        }
        Ok(())
    }

    /// Build the configured policy. `rng` seeds any random initial state.
    pub fn build(&self, rng: &mut dyn RngCore) -> Result<Box<dyn Policy + Send>> {
        self.validate()?;
        let policy: Box<dyn Policy + Send> = match self.kind {
            PolicyKind::KMind { trials } => {
                Box::new(KMind::new(rng, self.action_count).with_trials(trials))
            }
            PolicyKind::Markov2 { update } => {
                Box::new(MarkovMind::<2>::new(self.action_count).with_update(update))
            }
            PolicyKind::Markov3 { update } => {
                Box::new(MarkovMind::<3>::new(self.action_count).with_update(update))
            }
        };
        log::debug!("built {} policy over {} actions", policy.name(), policy.action_count());
        Ok(policy)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
