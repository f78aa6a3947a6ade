//! The three-activity controller.
//!
//! | Activity | Loop | Blocks on |
//! |----------|------|-----------|
//! | input | poll → [`InputHandler`], sleep when idle | nothing |
//! | sense | frame → sensor → policy → publish action | the frame source |
//! | actuation | every period: build and send the drive command | the transport |
//!
//! # Invariants
//!
//! - Every loop checks the shutdown flag at the top of each iteration.
//! - The frame source ending, a quit event, or a transport failure each
//!   request shutdown; `run` returns once all three activities stopped.
//! - A drive command is sent every period regardless of whether anything
//!   changed. The light toggles only on the transition into
//!   [`Action::Light`].
//! - The transport is closed exactly once, even after a send failure.
//! - An activity that panics requests shutdown while unwinding, so the
//!   others stop and `run` re-raises the panic.
//! - A controller runs once. Shutdown is permanent, so a second `run` fails
//!   with [`CurioError::AlreadyStopped`] without touching the transport.

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::action::{wheel_targets, Action};
use crate::config::CurioConfig;
use crate::control::joystick::{InputEvent, InputHandler, InputOutcome};
use crate::control::mode::Mode;
use crate::control::shared::SharedState;
use crate::control::transport::{Command, Transport};
use crate::control::ControlConfig;
use crate::error::{CurioError, Result};
use crate::frame::Frame;
use crate::policy::{Policy, PolicyConfig};
use crate::sensor::{sensor_from_config, SensorConfig, SpectralSensor, SpectrumReducer};

/// Camera collaborator.
pub trait FrameSource {
    /// Next frame, or `None` when the stream ended (requests shutdown).
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Joystick collaborator.
pub trait InputSource {
    /// Next pending event, or `None` when nothing is pending right now.
    fn poll(&mut self) -> Option<InputEvent>;
}

// ─── Controller ─────────────────────────────────────────────────────────────

/// Owns the configuration and the [`SharedState`] of one robot session.
#[derive(Debug)]
pub struct Controller {
    control: ControlConfig,
    sensor: SensorConfig,
    policy: PolicyConfig,
    shared: SharedState,
}

impl Controller {
    /// Validate the configuration and build an idle controller.
    ///
    /// The policy's action count follows `control.enable_light`.
    pub fn new(control: ControlConfig, sensor: SensorConfig, policy: PolicyConfig) -> Result<Self> {
        control.validate()?;
        sensor.validate()?;
        let policy = PolicyConfig {
            action_count: control.action_count(),
            ..policy
        };
        policy.validate()?;
        let shared = SharedState::new(control.speed);
        Ok(Self {
            control,
            sensor,
            policy,
            shared,
        })
    }

    /// Controller from the aggregated configuration.
    pub fn from_config(config: &CurioConfig) -> Result<Self> {
        Self::new(config.control.clone(), config.sensor.clone(), config.policy.clone())
    }

    /// State shared by the activities; also lets the host request shutdown.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Run until shutdown. Returns the first fatal error, if any.
    ///
    /// Single-shot: once the controller stopped (or the host requested
    /// shutdown through [`Controller::shared`]) this returns
    /// [`CurioError::AlreadyStopped`]. Build a new controller to run again.
    pub fn run<F, I, T>(&self, frames: &mut F, input: &mut I, transport: &mut T) -> Result<()>
    where
        F: FrameSource + Send,
        I: InputSource + Send,
        T: Transport + Send,
    {
        if !self.shared.is_running() {
            return Err(CurioError::AlreadyStopped);
        }
        let sensor = sensor_from_config(&self.sensor)?;
        let mut rng = StdRng::seed_from_u64(self.control.seed);
        let policy = self.policy.build(&mut rng)?;
        log::info!(
            "controller starting: {} policy, {} actions, {} ms period",
            policy.name(),
            policy.action_count(),
            self.control.period_ms
        );

        let shared = &self.shared;
        let control = &self.control;
        let result = thread::scope(|scope| {
            let input_task = scope.spawn(move || {
                let _guard = StopOnPanic(shared);
                input_loop(input, shared, control)
            });
            let sense_task = scope.spawn(move || {
                let _guard = StopOnPanic(shared);
                sense_loop(frames, sensor, policy, rng, shared, control.novelty_gain)
            });
            let actuation_task = scope.spawn(move || {
                let _guard = StopOnPanic(shared);
                actuation_loop(transport, shared, control)
            });

            let outcome = join(actuation_task);
            join(sense_task);
            join(input_task);
            outcome
        });
        match &result {
            Ok(()) => log::info!("controller stopped"),
            Err(e) => log::error!("controller stopped: {}", e),
        }
        result
    }
}

/// Requests shutdown when dropped during a panic.
struct StopOnPanic<'a>(&'a SharedState);

impl Drop for StopOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("controller activity panicked; stopping");
            self.0.request_shutdown();
        }
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

// ─── Activities ─────────────────────────────────────────────────────────────

fn input_loop<I: InputSource>(input: &mut I, shared: &SharedState, control: &ControlConfig) {
    let mut handler = InputHandler::new(control);
    let idle = Duration::from_millis(control.input_idle_ms);
    while shared.is_running() {
        match input.poll() {
            Some(event) => {
                if handler.handle(event, shared) == InputOutcome::Quit {
                    break;
                }
            }
            None => thread::sleep(idle),
        }
    }
}

fn sense_loop<F: FrameSource>(
    frames: &mut F,
    mut sensor: SpectralSensor<Box<dyn SpectrumReducer + Send>>,
    mut policy: Box<dyn Policy + Send>,
    mut rng: StdRng,
    shared: &SharedState,
    novelty_gain: f64,
) {
    while shared.is_running() {
        let Some(frame) = frames.next_frame() else {
            log::info!("frame source ended after {} frames", sensor.frames_sensed());
            shared.request_shutdown();
            break;
        };
        let novelty = match sensor.sense(&frame) {
            Ok(novelty) => novelty,
            Err(e) => {
                log::debug!("frame skipped: {}", e);
                continue;
            }
        };
        let action = policy.step(&mut rng, novelty * novelty_gain);
        shared.publish_action(action);
    }
}

fn actuation_loop<T: Transport>(transport: &mut T, shared: &SharedState, control: &ControlConfig) -> Result<()> {
    let period = Duration::from_millis(control.period_ms);
    let slice = Duration::from_millis(control.input_idle_ms.max(1));
    let mut actuator = Actuator::default();
    let mut commands = Vec::with_capacity(2);

    let mut outcome = Ok(());
    while sleep_while_running(shared, period, slice) {
        commands.clear();
        actuator.tick(shared, &mut commands);
        if let Err(e) = commands.iter().try_for_each(|c| transport.send(c)) {
            shared.request_shutdown();
            outcome = Err(e);
            break;
        }
    }
    if outcome.is_ok() {
        outcome = transport.send(&Command::Drive { left: 0.0, right: 0.0 });
    }
    let closed = transport.close();
    outcome.and(closed)
}

/// Sleep for `period` in `slice` steps. False once shutdown was requested.
fn sleep_while_running(shared: &SharedState, period: Duration, slice: Duration) -> bool {
    let deadline = Instant::now() + period;
    loop {
        if !shared.is_running() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(slice.min(deadline - now));
    }
}

/// Turns the shared state into commands once per period.
#[derive(Debug, Default)]
struct Actuator {
    wheels: (f64, f64),
    light_on: bool,
    previous: Option<Action>,
}

impl Actuator {
    fn tick(&mut self, shared: &SharedState, out: &mut Vec<Command>) {
        let speed = shared.speed();
        match shared.mode() {
            Mode::Manual => {
                let (left, right) = shared.sticks();
                self.wheels = wheel_targets(left, right, speed);
                self.previous = None;
            }
            Mode::Autonomous => {
                let action = Action::from_index(shared.action());
                match action.sticks() {
                    Some((left, right)) => self.wheels = wheel_targets(left, right, speed),
                    None => {
                        if self.previous != Some(Action::Light) {
                            self.light_on = !self.light_on;
                            out.push(Command::Light { on: self.light_on });
                        }
                    }
                }
                self.previous = Some(action);
            }
        }
        out.push(Command::Drive {
            left: self.wheels.0,
            right: self.wheels.1,
        });
    }
}

// ─── Scripted collaborators ─────────────────────────────────────────────────

/// Replays a fixed list of frames, optionally paced.
#[derive(Clone, Debug)]
pub struct ScriptedFrames {
    frames: VecDeque<Frame>,
    interval: Duration,
}

impl ScriptedFrames {
    /// Deliver `frames` in order, waiting `interval` before each.
    pub fn new(frames: impl IntoIterator<Item = Frame>, interval: Duration) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            interval,
        }
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> Option<Frame> {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        self.frames.pop_front()
    }
}

/// Replays input events at fixed offsets from the first poll.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<(Duration, InputEvent)>,
    started: Option<Instant>,
}

impl ScriptedInput {
    /// `events` as `(offset, event)` pairs; offsets must be non-decreasing.
    pub fn new(events: impl IntoIterator<Item = (Duration, InputEvent)>) -> Self {
        Self {
            events: events.into_iter().collect(),
            started: None,
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Option<InputEvent> {
        let started = *self.started.get_or_insert_with(Instant::now);
        let (due, _) = self.events.front()?;
        if started.elapsed() >= *due {
            self.events.pop_front().map(|(_, event)| event)
        } else {
            None
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
