//! Operator input: joystick events reduced to mode, speed and stick states.
//!
//! Each drive stick is a pair of axes. A stick reads [`StickState::Up`] only
//! when its lateral axis is strictly inside the dead zone and its drive axis is
//! pushed strictly beyond the threshold towards negative values; the mirror
//! case reads [`StickState::Down`]. Anything else is neutral, so diagonal
//! pushes stop the wheel rather than guessing.
//!
//! Buttons act on the press edge only (released → pressed). Holding a button
//! or receiving a repeated "pressed" report does nothing further.

use hashbrown::{HashMap, HashSet};

use crate::action::StickState;
use crate::control::mode::Mode;
use crate::control::shared::SharedState;
use crate::control::{ControlConfig, StickAxes};

/// A decoded event from the operator's input device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// Axis moved to a new absolute position.
    Axis {
        /// Axis id.
        axis: u8,
        /// Position, negative = up/left.
        value: i16,
    },
    /// Button changed state.
    Button {
        /// Button id.
        button: u8,
        /// True when pressed.
        pressed: bool,
    },
    /// A device was plugged in.
    DeviceAdded(u32),
    /// A device was unplugged.
    DeviceRemoved(u32),
    /// The operator asked to stop.
    Quit,
    /// Anything else the input layer reported (hats, balls, ...).
    Unknown(String),
}

/// Whether the input activity should keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Keep polling.
    Continue,
    /// Shutdown was requested.
    Quit,
}

/// Folds input events into [`SharedState`].
#[derive(Clone, Debug)]
pub struct InputHandler {
    config: ControlConfig,
    axes: HashMap<u8, i16>,
    buttons: HashMap<u8, bool>,
    devices: HashSet<u32>,
}

impl InputHandler {
    /// Handler with every axis centred and every button released.
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            config: config.clone(),
            axes: HashMap::new(),
            buttons: HashMap::new(),
            devices: HashSet::new(),
        }
    }

    /// Last reported position of `axis` (0 if never reported).
    pub fn axis(&self, axis: u8) -> i16 {
        self.axes.get(&axis).copied().unwrap_or(0)
    }

    /// Number of attached devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Reduce one stick's axis pair to a stick state.
    pub fn stick(&self, stick: StickAxes) -> StickState {
        let lateral = i32::from(self.axis(stick.lateral));
        let drive = i32::from(self.axis(stick.drive));
        let dead_zone = i32::from(self.config.lateral_dead_zone);
        let threshold = i32::from(self.config.drive_threshold);
        if lateral.abs() >= dead_zone {
            return StickState::Neutral;
        }
        if drive < -threshold {
            StickState::Up
        } else if drive > threshold {
            StickState::Down
        } else {
            StickState::Neutral
        }
    }

    /// Apply one event to `shared`.
    pub fn handle(&mut self, event: InputEvent, shared: &SharedState) -> InputOutcome {
        match event {
            InputEvent::Axis { axis, value } => {
                self.axes.insert(axis, value);
                let (left, right) = (self.config.left_stick, self.config.right_stick);
                let touches = |s: StickAxes| axis == s.lateral || axis == s.drive;
                if shared.mode() == Mode::Manual {
                    if touches(left) {
                        shared.set_left(self.stick(left));
                    }
                    if touches(right) {
                        shared.set_right(self.stick(right));
                    }
                }
            }
            InputEvent::Button { button, pressed } => {
                let was_pressed = self.buttons.insert(button, pressed).unwrap_or(false);
                if pressed && !was_pressed {
                    self.on_press(button, shared);
                }
            }
            InputEvent::DeviceAdded(id) => {
                self.devices.insert(id);
                log::debug!("input device {} connected", id);
            }
            InputEvent::DeviceRemoved(id) => {
                self.devices.remove(&id);
                // Stale axes would otherwise keep the wheels turning.
                self.axes.clear();
                shared.set_sticks(StickState::Neutral, StickState::Neutral);
                log::debug!("input device {} disconnected", id);
            }
            InputEvent::Quit => {
                log::info!("operator requested shutdown");
                shared.request_shutdown();
                return InputOutcome::Quit;
            }
            InputEvent::Unknown(kind) => {
                log::warn!("ignoring unknown input event: {}", kind);
            }
        }
        InputOutcome::Continue
    }

    fn on_press(&mut self, button: u8, shared: &SharedState) {
        if button == self.config.mode_button {
            let mode = shared.toggle_mode();
            log::debug!("mode -> {}", mode);
        } else if button == self.config.speed_button {
            let speed = self.config.next_speed(shared.speed());
            shared.set_speed(speed);
            log::debug!("speed -> {:.1}", speed);
        } else {
            log::debug!("button {} has no binding", button);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
