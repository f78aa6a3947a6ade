//! Portable snapshot of a [`MarkovMind`] for persistence between sessions.
//!
//! A snapshot stores the context width, the reinforcement rule, the current
//! context and every `(context, values)` entry, sorted by context so the same
//! mind always serialises to the same document. Contexts are stored as plain
//! byte vectors and checked against `K` on restore.
//!
//! ```rust,ignore
//! use curio_core::policy::MarkovMind;
//! use curio_core::snapshot::MarkovSnapshot;
//!
//! let snapshot = MarkovSnapshot::from_mind(&mind);
//! let json = serde_json::to_string(&snapshot)?;
//! let restored: MarkovMind<3> = serde_json::from_str::<MarkovSnapshot>(&json)?.restore()?;
//! ```
//!
//! This module requires the `serde` feature.

use hashbrown::HashMap;

use crate::error::{CurioError, Result};
use crate::policy::{MarkovMind, MarkovUpdate};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// Serializable state of a [`MarkovMind`].
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct MarkovSnapshot {
    /// Format version, [`SNAPSHOT_VERSION`] for new snapshots.
    pub version: u16,
    /// Context width `K`.
    pub context_len: usize,
    /// Actions per value vector.
    pub action_count: usize,
    /// Reinforcement rule.
    pub update: MarkovUpdate,
    /// Current context, oldest symbol first.
    pub context: Vec<u8>,
    /// Vector stored on the last step, if any.
    pub previous: Option<Vec<f64>>,
    /// Action returned by the last step.
    pub last_action: usize,
    /// Every visited context, sorted by context bytes.
    pub entries: Vec<ContextEntry>,
}

/// One row of the value table.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct ContextEntry {
    /// Context bytes, oldest first.
    pub context: Vec<u8>,
    /// Action values.
    pub values: Vec<f64>,
}

impl MarkovSnapshot {
    /// Capture `mind`.
    pub fn from_mind<const K: usize>(mind: &MarkovMind<K>) -> Self {
        let mut entries: Vec<ContextEntry> = mind
            .entries()
            .map(|(context, values)| ContextEntry {
                context: context.to_vec(),
                values: values.to_vec(),
            })
            .collect();
        entries.sort_by(|a, b| a.context.cmp(&b.context));
        Self {
            version: SNAPSHOT_VERSION,
            context_len: K,
            action_count: mind.action_count(),
            update: mind.update_rule(),
            context: mind.context().to_vec(),
            previous: mind.previous().map(<[f64]>::to_vec),
            last_action: mind.last_action(),
            entries,
        }
    }

    /// Number of stored contexts.
    pub fn context_count(&self) -> usize {
        self.entries.len()
    }

    /// Rebuild the mind. Fails when `K` or any vector length disagrees with
    /// the snapshot.
    pub fn restore<const K: usize>(&self) -> Result<MarkovMind<K>> {
        if self.version != SNAPSHOT_VERSION {
            return Err(CurioError::InvalidConfig(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if self.context_len != K {
            return Err(CurioError::InvalidConfig(format!(
                "snapshot has {}-byte contexts, mind expects {}",
                self.context_len, K
            )));
        }
        let vector_ok = |v: &[f64]| v.len() == self.action_count;
        let mut table = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !vector_ok(&entry.values) {
                return Err(CurioError::InvalidConfig(format!(
                    "context {:?} has {} values, expected {}",
                    entry.context,
                    entry.values.len(),
                    self.action_count
                )));
            }
            table.insert(to_context::<K>(&entry.context)?, entry.values.clone());
        }
        if let Some(previous) = &self.previous {
            if !vector_ok(previous) {
                return Err(CurioError::InvalidConfig("previous vector has the wrong length".into()));
            }
        }
        Ok(MarkovMind::from_parts(
            self.action_count,
            self.update,
            to_context::<K>(&self.context)?,
            table,
            self.previous.clone(),
            self.last_action,
        ))
    }
}

fn to_context<const K: usize>(bytes: &[u8]) -> Result<[u8; K]> {
    <[u8; K]>::try_from(bytes).map_err(|_| {
        CurioError::InvalidConfig(format!("context {:?} is not {} bytes long", bytes, K))
    })
}

// ─── Tests ──────────────────────────────────────────────────────────────────
