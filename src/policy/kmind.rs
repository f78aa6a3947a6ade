/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Compression-search mind.
//!
//! `KMind` keeps two fixed-size byte histories and scores every candidate
//! action by how much it would change the compressibility of the combined
//! state/action record. Candidates that make the record harder to compress
//! (more surprising) are favoured.
//!
//! ```text
//! state history:  [s  a  s  a  s  a  ...]   s = novelty symbol, a = action slot
//!                  ^state cursor (even)
//!                     ^action cursor (odd)
//! action history: [a0 a1 a2 ...]            a0 = most recent action
//! ```
//!
//! # Invariants
//!
//! - Both histories are exactly [`HISTORY_SIZE`] bytes for the mind's lifetime.
//! - The state cursor stays even and the action cursor odd; both advance by 2
//!   per step modulo [`HISTORY_SIZE`].
//! - `filter.len() == action_count`; every entry stays in [0, ~1] since it is
//!   a running average of compression fractions.
//! - After a step, `action_history[0]` is the returned action and the action
//!   slot holds the winner's score on the 0–255 complexity scale.
//! - While candidates are tried, the action slot holds each candidate's
//!   action-history complexity, so the state score sees the candidate.

use rand::{Rng, RngCore};

use crate::complexity::{ComplexityEstimator, DeflateEstimator, COMPLEXITY_SCALE};
use crate::policy::distribution::{sample_index, softmax};
use crate::policy::{novelty_symbol, Policy};

/// Capacity of each byte history.
pub const HISTORY_SIZE: usize = 1024;

/// Softmax temperature applied to the filtered candidate scores.
pub const KMIND_TEMPERATURE: f64 = 0.4;

/// How candidate trials treat the action history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CandidateTrials {
    /// Every trial prepends its candidate onto the history left by the
    /// previous trial, so later candidates are scored against a history that
    /// already contains the earlier ones. The winner then overwrites slot 0.
    #[default]
    Sequential,
    /// Every trial starts from the history as it was before the step; the
    /// winner is prepended exactly once.
    Restored,
}

/// Compression-search action-value policy.
#[derive(Clone)]
pub struct KMind<E = DeflateEstimator> {
    estimator: E,
    trials: CandidateTrials,
    action_count: usize,
    action_history: Vec<u8>,
    state_history: Vec<u8>,
    state_cursor: usize,
    action_cursor: usize,
    filter: Vec<f64>,
    // Construction-time histories, restored by `reset`.
    initial: (Vec<u8>, Vec<u8>),
    // Reused between steps.
    scratch: Vec<u8>,
    scores: Vec<f64>,
}

impl KMind<DeflateEstimator> {
    /// Mind over `action_count` actions with histories seeded from `rng`.
    pub fn new(rng: &mut dyn RngCore, action_count: usize) -> Self {
        Self::with_estimator(rng, action_count, DeflateEstimator::new())
    }
}

impl<E: ComplexityEstimator> KMind<E> {
    /// Mind using a custom complexity estimator.
    pub fn with_estimator(rng: &mut dyn RngCore, action_count: usize, estimator: E) -> Self {
        let mut state_history = vec![0u8; HISTORY_SIZE];
        let mut action_history = vec![0u8; HISTORY_SIZE];
        for i in 0..HISTORY_SIZE {
            state_history[i] = rng.gen();
            action_history[i] = rng.gen();
        }
        Self {
            estimator,
            trials: CandidateTrials::default(),
            action_count,
            initial: (action_history.clone(), state_history.clone()),
            action_history,
            state_history,
            state_cursor: 0,
            action_cursor: 1,
            filter: vec![0.0; action_count],
            scratch: Vec::with_capacity(HISTORY_SIZE),
            scores: vec![0.0; action_count],
        }
    }

    /// Select the candidate trial mode.
    pub fn with_trials(mut self, trials: CandidateTrials) -> Self {
        self.trials = trials;
        self
    }

    /// The candidate trial mode.
    pub fn trials(&self) -> CandidateTrials {
        self.trials
    }

    /// Most recent action first.
    pub fn action_history(&self) -> &[u8] {
        &self.action_history
    }

    /// Interleaved novelty symbols and action-slot bytes.
    pub fn state_history(&self) -> &[u8] {
        &self.state_history
    }

    /// Index of the latest novelty symbol in the state history.
    pub fn state_cursor(&self) -> usize {
        self.state_cursor
    }

    /// Index of the latest action entropy in the state history.
    pub fn action_cursor(&self) -> usize {
        self.action_cursor
    }

    /// Candidate scores of the last step (state complexity as a fraction of
    /// full scale), indexed by action.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Filtered candidate scores.
    pub fn filter(&self) -> &[f64] {
        &self.filter
    }

    /// Run one step and return the chosen action index.
    pub fn step(&mut self, rng: &mut dyn RngCore, novelty: f64) -> usize {
        self.state_cursor = (self.state_cursor + 2) % HISTORY_SIZE;
        self.state_history[self.state_cursor] = novelty_symbol(novelty);
        self.action_cursor = (self.action_cursor + 2) % HISTORY_SIZE;

        if self.trials == CandidateTrials::Restored {
            self.scratch.clear();
            self.scratch.extend_from_slice(&self.action_history);
        }

        for a in 0..self.action_count {
            if self.trials == CandidateTrials::Restored {
                self.action_history.copy_from_slice(&self.scratch);
            }
            prepend(&mut self.action_history, a as u8);
            let action_entropy = self.estimator.estimate(&self.action_history);
            self.state_history[self.action_cursor] = novelty_symbol(action_entropy);
            self.scores[a] = self.estimator.estimate(&self.state_history) / COMPLEXITY_SCALE;
        }

        for (f, s) in self.filter.iter_mut().zip(&self.scores) {
            *f = (*f + s) / 2.0;
        }
        let probabilities = softmax(&self.filter, KMIND_TEMPERATURE);
        let action = sample_index(&probabilities, rng.gen::<f64>());

        self.state_history[self.action_cursor] = novelty_symbol(COMPLEXITY_SCALE * self.scores[action]);
        match self.trials {
            CandidateTrials::Sequential => self.action_history[0] = action as u8,
            CandidateTrials::Restored => {
                self.action_history.copy_from_slice(&self.scratch);
                prepend(&mut self.action_history, action as u8);
            }
        }
        log::trace!("kmind: novelty={:.2} action={} filter={:?}", novelty, action, self.filter);
        action
    }

    /// Restore the construction-time histories, cursors and filter.
    pub fn reset(&mut self) {
        self.action_history.copy_from_slice(&self.initial.0);
        self.state_history.copy_from_slice(&self.initial.1);
        self.state_cursor = 0;
        self.action_cursor = 1;
        self.filter.iter_mut().for_each(|f| *f = 0.0);
    }
}

/// Shift right by one (oldest byte dropped) and write `byte` at index 0.
fn prepend(history: &mut [u8], byte: u8) {
    let len = history.len();
    if len == 0 {
        return;
    }
    history.copy_within(0..len - 1, 1);
    history[0] = byte;
}

impl<E: ComplexityEstimator> Policy for KMind<E> {
    fn step(&mut self, rng: &mut dyn RngCore, novelty: f64) -> usize {
        KMind::step(self, rng, novelty)
    }

    fn reset(&mut self) {
        KMind::reset(self);
    }

    fn action_count(&self) -> usize {
        self.action_count
    }

    fn name(&self) -> &'static str {
        "kmind"
    }
}

impl<E> core::fmt::Debug for KMind<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KMind")
            .field("trials", &self.trials)
            .field("action_count", &self.action_count)
            .field("state_cursor", &self.state_cursor)
            .field("action_cursor", &self.action_cursor)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mind(trials: CandidateTrials) -> (KMind, StdRng) {
        let mut rng = StdRng::seed_from_u64(1);
        let mind = KMind::new(&mut rng, 5).with_trials(trials);
        (mind, rng)
    }

    #[test]
    fn test_cursors_interleave_and_wrap() {
        let (mut k, mut rng) = mind(CandidateTrials::Sequential);
        assert_eq!((k.state_cursor(), k.action_cursor()), (0, 1));
        k.step(&mut rng, 10.0);
        assert_eq!((k.state_cursor(), k.action_cursor()), (2, 3));
        for _ in 1..HISTORY_SIZE / 2 {
            k.step(&mut rng, 10.0);
        }
        assert_eq!((k.state_cursor(), k.action_cursor()), (0, 1));
    }

    #[test]
    fn test_step_writes_novelty_symbol_and_commits_action() {
        let (mut k, mut rng) = mind(CandidateTrials::Sequential);
        let a = k.step(&mut rng, 41.6);
        assert!(a < 5);
        assert_eq!(k.state_history()[k.state_cursor()], 42);
        assert_eq!(k.action_history()[0], a as u8);
        assert_eq!(k.action_history().len(), HISTORY_SIZE);
        assert_eq!(k.state_history().len(), HISTORY_SIZE);
    }

    #[test]
    fn test_filter_stays_in_unit_range() {
        let (mut k, mut rng) = mind(CandidateTrials::Sequential);
        for i in 0..32 {
            k.step(&mut rng, (i * 13 % 256) as f64);
        }
        assert!(k.filter().iter().all(|f| *f > 0.0 && *f < 1.2), "{:?}", k.filter());
    }

    #[test]
    fn test_step_commits_winner_score_into_action_slot() {
        for trials in [CandidateTrials::Sequential, CandidateTrials::Restored] {
            let (mut k, mut rng) = mind(trials);
            for i in 0..6 {
                let a = k.step(&mut rng, (i * 17) as f64);
                let committed = k.state_history()[k.action_cursor()];
                assert_eq!(committed, novelty_symbol(COMPLEXITY_SCALE * k.scores()[a]));
                // A 1 KiB history of random bytes never compresses to nothing.
                assert!(committed > 0);
            }
        }
    }

    #[test]
    fn test_sequential_trials_shift_once_per_candidate() {
        let (mut k, mut rng) = mind(CandidateTrials::Sequential);
        let before = k.action_history().to_vec();
        k.step(&mut rng, 0.0);
        // Five candidates were prepended; the tail is the old history shifted by five.
        assert_eq!(&k.action_history()[5..], &before[..HISTORY_SIZE - 5]);
        assert_eq!(&k.action_history()[1..5], &[3, 2, 1, 0]);
    }

    #[test]
    fn test_restored_trials_shift_once_per_step() {
        let (mut k, mut rng) = mind(CandidateTrials::Restored);
        let before = k.action_history().to_vec();
        let a = k.step(&mut rng, 0.0);
        assert_eq!(k.action_history()[0], a as u8);
        assert_eq!(&k.action_history()[1..], &before[..HISTORY_SIZE - 1]);
    }

    #[test]
    fn test_same_seed_same_actions() {
        let run = || {
            let (mut k, mut rng) = mind(CandidateTrials::Sequential);
            (0..24).map(|i| k.step(&mut rng, (i * 37 % 200) as f64)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let (mut k, mut rng) = mind(CandidateTrials::Restored);
        let fresh = k.clone();
        for _ in 0..4 {
            k.step(&mut rng, 99.0);
        }
        k.reset();
        assert_eq!(k.action_history(), fresh.action_history());
        assert_eq!(k.state_history(), fresh.state_history());
        assert_eq!((k.state_cursor(), k.action_cursor()), (0, 1));
        assert!(k.filter().iter().all(|f| *f == 0.0));
    }
}
