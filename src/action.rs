//! Discrete robot actions and their mapping to differential wheel targets.
//!
//! A two-wheeled base is driven by a pair of signed speeds `(left, right)`.
//! Each side is summarised by a [`StickState`]: pushed up (forward at the
//! current speed), pushed down (reverse), or neutral. Both the autonomous
//! policy and the operator's sticks reduce to a pair of stick states, so the
//! actuation loop only ever converts `(StickState, StickState)` into speeds.
//!
//! # Action indices
//!
//! | Index | Action | Wheels |
//! |-------|--------|--------|
//! | 0 | [`Action::Left`] | `(-s, +s)` |
//! | 1 | [`Action::Right`] | `(+s, -s)` |
//! | 2 | [`Action::Forward`] | `(+s, +s)` |
//! | 3 | [`Action::Backward`] | `(-s, -s)` |
//! | 4 | [`Action::None`] | `(0, 0)` |
//! | 5 | [`Action::Light`] | unchanged, toggles the accessory |

/// Number of locomotion actions (indices 0..=4).
pub const ACTION_COUNT: usize = 5;

/// Number of actions when the light accessory is enabled.
pub const ACTION_COUNT_WITH_LIGHT: usize = 6;

/// A discrete action chosen by a policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Spin left in place.
    Left,
    /// Spin right in place.
    Right,
    /// Drive forward.
    Forward,
    /// Drive backward.
    Backward,
    /// Stop both wheels.
    None,
    /// Toggle the light accessory; wheels keep their previous targets.
    Light,
}

impl Action {
    /// Every action in index order.
    pub const ALL: [Action; ACTION_COUNT_WITH_LIGHT] = [
        Action::Left,
        Action::Right,
        Action::Forward,
        Action::Backward,
        Action::None,
        Action::Light,
    ];

    /// Action for a policy index. Indices past the table map to `None`.
    pub fn from_index(index: usize) -> Action {
        Self::ALL.get(index).copied().unwrap_or(Action::None)
    }

    /// Policy index of this action.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stick states that realise this action, or `None` for the accessory
    /// action, which leaves the wheels alone.
    pub fn sticks(self) -> Option<(StickState, StickState)> {
        use StickState::{Down, Neutral, Up};
        match self {
            Action::Forward  => Some((Up, Up)),
            Action::Backward => Some((Down, Down)),
            Action::Left     => Some((Down, Up)),
            Action::Right    => Some((Up, Down)),
            Action::None     => Some((Neutral, Neutral)),
            Action::Light    => Option::None,
        }
    }
}

/// Reduced position of one drive stick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum StickState {
    /// Centred: wheel stopped.
    #[default]
    Neutral = 0,
    /// Pushed fully forward.
    Up = 1,
    /// Pushed fully back.
    Down = 2,
}

impl StickState {
    /// Signed wheel speed for this stick at `speed`.
    pub fn wheel(self, speed: f64) -> f64 {
        match self {
            StickState::Up      => speed,
            StickState::Down    => -speed,
            StickState::Neutral => 0.0,
        }
    }

    /// Decode the value stored by [`StickState::to_u8`]; unknown values are
    /// neutral.
    pub fn from_u8(value: u8) -> StickState {
        match value {
            1 => StickState::Up,
            2 => StickState::Down,
            _ => StickState::Neutral,
        }
    }

    /// Compact encoding for atomic storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// `(left, right)` wheel speeds for a pair of stick states.
pub fn wheel_targets(left: StickState, right: StickState, speed: f64) -> (f64, f64) {
    (left.wheel(speed), right.wheel(speed))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
