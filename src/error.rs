//! Error types for the curiosity core.
//!
//! Only setup and transport failures are fatal (they abort the controller).
//! Numeric edge cases inside the sensor and the policies are recovered
//! locally and never surface here.

use thiserror::Error;

/// Errors produced by the curiosity core.
#[derive(Error, Debug)]
pub enum CurioError {
    /// A frame was constructed with inconsistent dimensions.
    #[error("invalid frame: {width}x{height} needs {expected} samples, got {got}")]
    InvalidFrame {
        /// Frame width in pixels.
        width: usize,
        /// Frame height in pixels.
        height: usize,
        /// Number of samples required (`width * height`).
        expected: usize,
        /// Number of samples supplied.
        got: usize,
    },

    /// A sensor received a frame whose size differs from its first frame.
    #[error("frame size mismatch: sensor expects {expected:?}, got {got:?}")]
    FrameSizeMismatch {
        /// `(width, height)` fixed by the first sensed frame.
        expected: (usize, usize),
        /// `(width, height)` of the offending frame.
        got: (usize, usize),
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The actuator link failed (open, handshake or send).
    #[error("transport failure: {0}")]
    Transport(#[source] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Animated GIF encoding failed.
    #[error("render error: {0}")]
    Render(#[from] gif::EncodingError),

    /// `Controller::run` was called after the controller had stopped.
    #[error("controller already stopped; build a new one to run again")]
    AlreadyStopped,

    /// Any other I/O failure (files written by the simulation harness).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CurioError>;
