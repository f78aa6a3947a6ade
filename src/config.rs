//! Aggregated configuration.
//!
//! Every component carries its own config struct with a `Default` impl and a
//! `validate` method; [`CurioConfig`] bundles them so a robot or simulation
//! session can be described by a single JSON document (`serde` feature):
//!
//! ```json
//! {
//!   "sensor":  { "reducer": "Entropy", "depth": 8, "noise_sigma": null, "noise_seed": 1 },
//!   "policy":  { "kind": { "Markov3": { "update": "Complement" } }, "action_count": 5 },
//!   "control": { "period_ms": 300, "novelty_gain": 4.0, ... },
//!   "sim":     { "seed": 1, "width": 16, "height": 16, "iterations": 1024, ... }
//! }
//! ```
//!
//! Missing sections fall back to their defaults.

use crate::control::ControlConfig;
use crate::error::Result;
use crate::policy::PolicyConfig;
use crate::sensor::SensorConfig;
use crate::sim::SimConfig;

/// Configuration of every component.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CurioConfig {
    /// Novelty sensor.
    pub sensor: SensorConfig,
    /// Action-value policy.
    pub policy: PolicyConfig,
    /// Robot controller.
    pub control: ControlConfig,
    /// Simulation harness.
    pub sim: SimConfig,
}

impl CurioConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.sensor.validate()?;
        self.policy.validate()?;
        self.control.validate()?;
        self.sim.validate()
    }

    /// Parse and validate a JSON document.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CurioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON of this configuration.
    #[cfg(feature = "serde")]
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CurioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_section_is_reported() {
        let mut config = CurioConfig::default();
        config.control.period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CurioConfig::from_json_str(r#"{ "sim": { "seed": 7, "width": 16, "height": 16, "iterations": 10, "depth": 8, "update": "Complement" } }"#)
            .unwrap();
        assert_eq!(config.sim.seed, 7);
        assert_eq!(config.control, ControlConfig::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let config = CurioConfig::default();
        let json = config.to_json_string().unwrap();
        assert_eq!(CurioConfig::from_json_str(&json).unwrap(), config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_bad_json_is_an_error() {
        assert!(CurioConfig::from_json_str("{ not json").is_err());
        assert!(CurioConfig::from_json_str(r#"{ "control": { "period_ms": 0 } }"#).is_err());
    }
}
