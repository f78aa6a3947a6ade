//! Actuator link: line-delimited JSON commands for the robot's driver board.
//!
//! | Command | Line |
//! |---------|------|
//! | [`Command::Handshake`] | `{"T":900,"main":2,"module":0}` |
//! | [`Command::Drive`] | `{"T":1,"L":<left>,"R":<right>}` |
//! | [`Command::Light`] | `{"T":132,"IO4":<pwm>,"IO5":<pwm>}` |
//!
//! Every write is flushed immediately. A failed write is fatal for the
//! controller; nothing here retries.

use std::io::{self, Write};

use serde_json::{json, Value};

use crate::error::{CurioError, Result};

/// PWM duty written to both accessory outputs when the light is on.
pub const LIGHT_ON_PWM: u8 = 255;

/// A command for the driver board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Select the board's control profile; sent once when the link opens.
    Handshake,
    /// Differential wheel speeds.
    Drive {
        /// Left wheel speed.
        left: f64,
        /// Right wheel speed.
        right: f64,
    },
    /// Switch the light accessory.
    Light {
        /// True to switch on.
        on: bool,
    },
}

impl Command {
    /// JSON object for this command.
    pub fn to_json(&self) -> Value {
        match *self {
            Command::Handshake => json!({ "T": 900, "main": 2, "module": 0 }),
            Command::Drive { left, right } => json!({ "T": 1, "L": left, "R": right }),
            Command::Light { on } => {
                let pwm = if on { LIGHT_ON_PWM } else { 0 };
                json!({ "T": 132, "IO4": pwm, "IO5": pwm })
            }
        }
    }
}

/// Sink for actuator commands.
pub trait Transport {
    /// Send one command. Errors are fatal.
    fn send(&mut self, command: &Command) -> Result<()>;

    /// Release the link. Called exactly once by the controller on shutdown.
    fn close(&mut self) -> Result<()>;
}

/// [`Transport`] writing one JSON object per line to any writer (serial
/// port, socket, stdout).
#[derive(Debug)]
pub struct JsonLineTransport<W: Write> {
    writer: W,
    closed: bool,
    sent: u64,
}

impl<W: Write> JsonLineTransport<W> {
    /// Wrap `writer` and send the handshake.
    pub fn open(writer: W) -> Result<Self> {
        let mut transport = Self {
            writer,
            closed: false,
            sent: 0,
        };
        transport.send(&Command::Handshake)?;
        Ok(transport)
    }

    /// Commands written so far, handshake included.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// True once [`Transport::close`] ran.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for JsonLineTransport<W> {
    fn send(&mut self, command: &Command) -> Result<()> {
        if self.closed {
            return Err(CurioError::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is closed",
            )));
        }
        let mut line = serde_json::to_vec(&command.to_json())?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .and_then(|()| self.writer.flush())
            .map_err(CurioError::Transport)?;
        self.sent += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        log::debug!("closing transport after {} commands", self.sent);
        self.writer.flush().map_err(CurioError::Transport)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(bytes: &[u8]) -> Vec<Value> {
        std::str::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_open_sends_handshake() {
        let t = JsonLineTransport::open(Vec::new()).unwrap();
        assert_eq!(t.sent(), 1);
        assert_eq!(lines(t.get_ref()), vec![json!({"T": 900, "main": 2, "module": 0})]);
    }

    #[test]
    fn test_drive_and_light_lines() {
        let mut t = JsonLineTransport::open(Vec::new()).unwrap();
        t.send(&Command::Drive { left: -0.2, right: 0.2 }).unwrap();
        t.send(&Command::Light { on: true }).unwrap();
        t.send(&Command::Light { on: false }).unwrap();
        let out = lines(&t.into_inner());
        assert_eq!(out[1], json!({"T": 1, "L": -0.2, "R": 0.2}));
        assert_eq!(out[2], json!({"T": 132, "IO4": 255, "IO5": 255}));
        assert_eq!(out[3], json!({"T": 132, "IO4": 0, "IO5": 0}));
    }

    #[test]
    fn test_send_after_close_fails() {
        let mut t = JsonLineTransport::open(Vec::new()).unwrap();
        t.close().unwrap();
        t.close().unwrap();
        assert!(t.is_closed());
        let err = t.send(&Command::Drive { left: 0.0, right: 0.0 }).unwrap_err();
        assert!(matches!(err, CurioError::Transport(_)));
    }

    #[derive(Debug)]
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_handshake_failure_is_reported() {
        let err = JsonLineTransport::open(Broken).unwrap_err();
        assert!(matches!(err, CurioError::Transport(_)));
    }
}
