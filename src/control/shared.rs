//! State shared between the controller's activities.
//!
//! # Invariants
//!
//! - Every field is a single atomic, so a reader never observes a torn value.
//! - The action slot is last-write-wins: the actuation loop applies whatever
//!   index was published most recently and never waits for a fresh one.
//! - Once `running` is cleared it is never set again.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

use crate::action::{Action, StickState};
use crate::control::mode::Mode;

/// Mode, manual targets, published action and shutdown flag.
#[derive(Debug)]
pub struct SharedState {
    mode: AtomicU8,
    left: AtomicU8,
    right: AtomicU8,
    speed_bits: AtomicU64,
    action: AtomicUsize,
    running: AtomicBool,
}

impl SharedState {
    /// Manual mode, neutral sticks, action `None`, running.
    pub fn new(speed: f64) -> Self {
        Self {
            mode: AtomicU8::new(Mode::Manual.to_u8()),
            left: AtomicU8::new(StickState::Neutral.to_u8()),
            right: AtomicU8::new(StickState::Neutral.to_u8()),
            speed_bits: AtomicU64::new(speed.to_bits()),
            action: AtomicUsize::new(Action::None.index()),
            running: AtomicBool::new(true),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Flip the mode and return the new one. Entering manual mode centres
    /// both sticks.
    pub fn toggle_mode(&self) -> Mode {
        let previous = Mode::from_u8(self.mode.fetch_xor(1, Ordering::AcqRel));
        let mode = previous.toggled();
        if mode == Mode::Manual {
            self.set_sticks(StickState::Neutral, StickState::Neutral);
        }
        mode
    }

    /// `(left, right)` manual stick states.
    pub fn sticks(&self) -> (StickState, StickState) {
        (
            StickState::from_u8(self.left.load(Ordering::Relaxed)),
            StickState::from_u8(self.right.load(Ordering::Relaxed)),
        )
    }

    /// Set both manual stick states.
    pub fn set_sticks(&self, left: StickState, right: StickState) {
        self.left.store(left.to_u8(), Ordering::Relaxed);
        self.right.store(right.to_u8(), Ordering::Relaxed);
    }

    /// Set the left stick state.
    pub fn set_left(&self, state: StickState) {
        self.left.store(state.to_u8(), Ordering::Relaxed);
    }

    /// Set the right stick state.
    pub fn set_right(&self, state: StickState) {
        self.right.store(state.to_u8(), Ordering::Relaxed);
    }

    /// Current wheel speed.
    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed_bits.load(Ordering::Relaxed))
    }

    /// Replace the wheel speed.
    pub fn set_speed(&self, speed: f64) {
        self.speed_bits.store(speed.to_bits(), Ordering::Relaxed);
    }

    /// Most recently published action index.
    pub fn action(&self) -> usize {
        self.action.load(Ordering::Acquire)
    }

    /// Publish a new action index.
    pub fn publish_action(&self, index: usize) {
        self.action.store(index, Ordering::Release);
    }

    /// False once shutdown was requested.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every activity to stop at its next loop check.
    pub fn request_shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            log::debug!("shutdown requested");
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(0.2)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
