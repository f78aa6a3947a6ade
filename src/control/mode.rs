//! Manual / autonomous operating mode.

/// Who drives the wheels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Mode {
    /// The operator's sticks drive the wheels; policy output is discarded.
    #[default]
    Manual = 0,
    /// The latest published policy action drives the wheels.
    Autonomous = 1,
}

impl Mode {
    /// The other mode.
    pub fn toggled(self) -> Mode {
        match self {
            Mode::Manual     => Mode::Autonomous,
            Mode::Autonomous => Mode::Manual,
        }
    }

    /// Decode the value stored by [`Mode::to_u8`]; unknown values are manual.
    pub fn from_u8(value: u8) -> Mode {
        if value == Mode::Autonomous as u8 {
            Mode::Autonomous
        } else {
            Mode::Manual
        }
    }

    /// Compact encoding for atomic storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Mode::Manual => f.write_str("manual"),
            Mode::Autonomous => f.write_str("autonomous"),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
