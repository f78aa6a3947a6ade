//! Closed-loop controller: operator input, sensing and actuation.
//!
//! ```text
//!  InputSource ──► InputHandler ──┐
//!                                 ├──► SharedState ──► actuation ──► Transport
//!  FrameSource ──► Sensor ► Policy┘    (atomics)       every period
//! ```
//!
//! Three activities run on scoped threads and communicate only through
//! [`SharedState`]. The operator can always take over: in [`Mode::Manual`]
//! the published action is ignored and the sticks drive the wheels.

pub mod joystick;
pub mod mode;
pub mod runtime;
pub mod shared;
pub mod transport;

pub use joystick::{InputEvent, InputHandler, InputOutcome};
pub use mode::Mode;
pub use runtime::{Controller, FrameSource, InputSource, ScriptedFrames, ScriptedInput};
pub use shared::SharedState;
pub use transport::{Command, JsonLineTransport, Transport};

use crate::error::{CurioError, Result};

/// Axis pair of one drive stick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StickAxes {
    /// Sideways axis; must stay inside the dead zone for the stick to count.
    pub lateral: u8,
    /// Forward/back axis; negative values push the stick up.
    pub drive: u8,
}

/// Controller configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlConfig {
    /// Actuation period in milliseconds. Default 300.
    pub period_ms: u64,
    /// Sleep between input polls when no event is pending. Default 16.
    pub input_idle_ms: u64,
    /// Initial wheel speed. Default 0.2.
    pub speed: f64,
    /// Increment applied by the speed button. Default 0.1.
    pub speed_step: f64,
    /// Speed the button wraps back to. Default 0.1.
    pub speed_min: f64,
    /// Highest speed before wrapping. Default 0.3.
    pub speed_max: f64,
    /// The lateral axis must stay strictly inside ±this. Default 20000.
    pub lateral_dead_zone: i16,
    /// The drive axis must go strictly beyond ±this. Default 32000.
    pub drive_threshold: i16,
    /// Left stick axes. Default (0, 1).
    pub left_stick: StickAxes,
    /// Right stick axes. Default (3, 4).
    pub right_stick: StickAxes,
    /// Button toggling manual/autonomous. Default 0.
    pub mode_button: u8,
    /// Button cycling the speed. Default 1.
    pub speed_button: u8,
    /// Multiplier applied to the novelty score before the policy sees it.
    /// Default 4.0.
    pub novelty_gain: f64,
    /// Seed of the policy RNG. Default 1.
    pub seed: u64,
    /// Offer the light accessory as a sixth action. Default false.
    pub enable_light: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period_ms: 300,
            input_idle_ms: 16,
            speed: 0.2,
            speed_step: 0.1,
            speed_min: 0.1,
            speed_max: 0.3,
            lateral_dead_zone: 20000,
            drive_threshold: 32000,
            left_stick: StickAxes { lateral: 0, drive: 1 },
            right_stick: StickAxes { lateral: 3, drive: 4 },
            mode_button: 0,
            speed_button: 1,
            novelty_gain: 4.0,
            seed: 1,
            enable_light: false,
        }
    }
}

impl ControlConfig {
    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if self.period_ms == 0 {
            return Err(CurioError::InvalidConfig("actuation period must be positive".into()));
        }
        let speeds = [self.speed, self.speed_step, self.speed_min, self.speed_max];
        if speeds.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(CurioError::InvalidConfig(format!(
                "speeds must be finite and non-negative, got {:?}",
                speeds
            )));
        }
        if self.speed_min > self.speed_max {
            return Err(CurioError::InvalidConfig(format!(
                "speed range is empty: {} > {}",
                self.speed_min, self.speed_max
            )));
        }
        if self.lateral_dead_zone < 0 || self.drive_threshold < 0 {
            return Err(CurioError::InvalidConfig("axis thresholds must be non-negative".into()));
        }
        if !self.novelty_gain.is_finite() {
            return Err(CurioError::InvalidConfig(format!(
                "novelty gain must be finite, got {}",
                self.novelty_gain
            )));
        }
        Ok(())
    }

    /// Actions the policy chooses between.
    pub fn action_count(&self) -> usize {
        if self.enable_light {
            crate::action::ACTION_COUNT_WITH_LIGHT
        } else {
            crate::action::ACTION_COUNT
        }
    }

    /// Speed after one press of the speed button.
    ///
    /// Raises by `speed_step`; anything above `speed_max` wraps to
    /// `speed_min`. A small tolerance keeps `0.2 + 0.1` from counting as
    /// above `0.3`.
    pub fn next_speed(&self, speed: f64) -> f64 {
        let next = speed + self.speed_step;
        if next > self.speed_max + 1e-9 {
            self.speed_min
        } else {
            next
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ControlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.action_count(), 5);
    }

    #[test]
    fn test_speed_cycle() {
        let config = ControlConfig::default();
        let mut speed = config.speed;
        let mut seen = Vec::new();
        for _ in 0..4 {
            speed = config.next_speed(speed);
            seen.push((speed * 10.0).round() as u32);
        }
        assert_eq!(seen, vec![3, 1, 2, 3]);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = ControlConfig { period_ms: 0, ..ControlConfig::default() };
        assert!(bad.validate().is_err());
        let bad = ControlConfig { speed_min: 0.5, ..ControlConfig::default() };
        assert!(bad.validate().is_err());
        let bad = ControlConfig { novelty_gain: f64::NAN, ..ControlConfig::default() };
        assert!(bad.validate().is_err());
    }
}
