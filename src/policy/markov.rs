/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Markov-context mind.
//!
//! The last `K` quantised novelty symbols form a context; every context owns a
//! vector of action values, created lazily with uniform random entries. Each
//! step samples an action from the softmax of the current context's values,
//! reinforces the vector, and slides the context forward by one symbol.
//!
//! # Invariants
//!
//! - Every stored value vector has exactly `action_count` entries.
//! - Contexts are never evicted, so the table holds at most `256^K` entries
//!   (and in practice only the contexts actually visited).
//! - RNG draws per step, in order: `action_count` initial values (only for an
//!   unseen context), then one selection draw. A fixed seed and novelty
//!   sequence therefore reproduce the same actions.

use hashbrown::HashMap;
use rand::{Rng, RngCore};

use crate::policy::distribution::{normalise, sample_index, softmax};
use crate::policy::{novelty_symbol, Policy};

/// How a context's value vector is reinforced after sampling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkovUpdate {
    /// Add `1 - previous[a]` to every action value, where `previous` is the
    /// vector stored on the previous step, then renormalise. Skipped on the
    /// first step.
    #[default]
    Complement,
    /// Add `amount` to the value of the previously chosen action, then
    /// renormalise.
    Bonus {
        /// Reward added per step.
        amount: f64,
    },
}

/// Action-value table keyed by the last `K` novelty symbols.
#[derive(Clone, Debug)]
pub struct MarkovMind<const K: usize> {
    action_count: usize,
    update: MarkovUpdate,
    context: [u8; K],
    table: HashMap<[u8; K], Vec<f64>>,
    previous: Option<Vec<f64>>,
    last_action: usize,
}

impl<const K: usize> MarkovMind<K> {
    /// Empty mind over `action_count` actions with the all-zero context.
    pub fn new(action_count: usize) -> Self {
        Self {
            action_count,
            update: MarkovUpdate::default(),
            context: [0; K],
            table: HashMap::new(),
            previous: None,
            last_action: 0,
        }
    }

    /// Select the reinforcement rule.
    pub fn with_update(mut self, update: MarkovUpdate) -> Self {
        self.update = update;
        self
    }

    /// The reinforcement rule.
    pub fn update_rule(&self) -> MarkovUpdate {
        self.update
    }

    /// Actions per value vector.
    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Current context, oldest symbol first.
    pub fn context(&self) -> [u8; K] {
        self.context
    }

    /// Number of contexts seen so far.
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Value vector stored for `context`, if it has been visited.
    pub fn values(&self, context: &[u8; K]) -> Option<&[f64]> {
        self.table.get(context).map(Vec::as_slice)
    }

    /// All stored `(context, values)` pairs in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&[u8; K], &[f64])> {
        self.table.iter().map(|(c, v)| (c, v.as_slice()))
    }

    /// Vector stored on the previous step.
    pub fn previous(&self) -> Option<&[f64]> {
        self.previous.as_deref()
    }

    /// Action returned by the previous step (0 before the first step).
    pub fn last_action(&self) -> usize {
        self.last_action
    }

    /// Rebuild a mind from previously exported state.
    pub(crate) fn from_parts(
        action_count: usize,
        update: MarkovUpdate,
        context: [u8; K],
        table: HashMap<[u8; K], Vec<f64>>,
        previous: Option<Vec<f64>>,
        last_action: usize,
    ) -> Self {
        Self {
            action_count,
            update,
            context,
            table,
            previous,
            last_action,
        }
    }

    /// Run one step and return the chosen action index.
    pub fn step(&mut self, rng: &mut dyn RngCore, novelty: f64) -> usize {
        let symbol = novelty_symbol(novelty);
        let action_count = self.action_count;
        let values = self
            .table
            .entry(self.context)
            .or_insert_with(|| (0..action_count).map(|_| rng.gen::<f64>()).collect());

        let probabilities = softmax(values, 1.0);
        let action = sample_index(&probabilities, rng.gen::<f64>());

        match self.update {
            MarkovUpdate::Complement => {
                if let Some(previous) = &self.previous {
                    for (v, p) in values.iter_mut().zip(previous) {
                        *v += 1.0 - p;
                    }
                    normalise(values);
                }
            }
            MarkovUpdate::Bonus { amount } => {
                if let Some(v) = values.get_mut(self.last_action) {
                    *v += amount;
                }
                normalise(values);
            }
        }

        self.previous.get_or_insert_with(Vec::new).clone_from(values);
        self.last_action = action;

        if K > 0 {
            self.context.copy_within(1.., 0);
            self.context[K - 1] = symbol;
        }
        log::trace!("markov<{}>: novelty={:.2} action={} contexts={}", K, novelty, action, self.table.len());
        action
    }

    /// Drop every learned context and return to the all-zero context.
    pub fn reset(&mut self) {
        self.table.clear();
        self.context = [0; K];
        self.previous = None;
        self.last_action = 0;
    }
}

impl<const K: usize> Policy for MarkovMind<K> {
    fn step(&mut self, rng: &mut dyn RngCore, novelty: f64) -> usize {
        MarkovMind::step(self, rng, novelty)
    }

    fn reset(&mut self) {
        MarkovMind::reset(self);
    }

    fn action_count(&self) -> usize {
        self.action_count
    }

    fn name(&self) -> &'static str {
        match K {
            2 => "markov2",
            3 => "markov3",
            _ => "markov",
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_step_is_deterministic_for_fixed_seed() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut mind = MarkovMind::<3>::new(5);
            (0..200)
                .map(|i| mind.step(&mut rng, (i * 7 % 13) as f64))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(1), run(1));
    }

    #[test]
    fn test_first_step_stores_initial_values() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut mind = MarkovMind::<2>::new(4);
        let a = mind.step(&mut rng, 9.0);
        assert!(a < 4);

        let mut replay = StdRng::seed_from_u64(3);
        let expected: Vec<f64> = (0..4).map(|_| replay.gen::<f64>()).collect();
        assert_eq!(mind.values(&[0, 0]).unwrap(), expected.as_slice());
        assert_eq!(mind.previous().unwrap(), expected.as_slice());
    }

    #[test]
    fn test_complement_renormalises_after_first_step() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut mind = MarkovMind::<2>::new(4);
        mind.step(&mut rng, 1.0);
        mind.step(&mut rng, 2.0);
        let stored = mind.values(&[0, 1]).unwrap();
        let sum: f64 = stored.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum={}", sum);
        assert!(stored.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_bonus_rewards_previous_action() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut mind = MarkovMind::<2>::new(3).with_update(MarkovUpdate::Bonus { amount: 0.1 });
        mind.step(&mut rng, 0.0);
        let stored = mind.values(&[0, 0]).unwrap();
        let sum: f64 = stored.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum={}", sum);
    }

    #[test]
    fn test_context_slides_left() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut mind = MarkovMind::<3>::new(5);
        for n in [5.0, 6.2, 6.6, 300.0] {
            mind.step(&mut rng, n);
        }
        assert_eq!(mind.context(), [6, 7, 255]);
    }

    #[test]
    fn test_table_growth_is_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut mind = MarkovMind::<2>::new(5);
        let mut novelty = StdRng::seed_from_u64(12);
        for _ in 0..10_000 {
            let n = novelty.gen_range(0..3) as f64;
            let a = mind.step(&mut rng, n);
            assert!(a < 5);
        }
        // Three symbols, two-byte context.
        assert!(mind.table_len() <= 9, "len={}", mind.table_len());
        assert!(mind.entries().all(|(_, v)| v.len() == 5));
    }

    #[test]
    fn test_reset_forgets_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut mind = MarkovMind::<3>::new(5);
        for i in 0..10 {
            mind.step(&mut rng, i as f64);
        }
        mind.reset();
        assert_eq!(mind.table_len(), 0);
        assert_eq!(mind.context(), [0, 0, 0]);
        assert!(mind.previous().is_none());
    }
}
