//! # Robot Controller Dry Run
//!
//! Runs the full three-thread controller without hardware: a synthetic camera
//! (a bright blob drifting over a textured floor), a scripted joystick, and
//! the driver-board protocol written to stdout.
//!
//! The script drives forward by hand, hands control to the curiosity policy,
//! bumps the speed once, and quits after a few seconds.
//!
//! ```text
//! cargo run --example robot
//! RUST_LOG=debug cargo run --example robot 2>log.txt
//! ```

use std::thread;
use std::time::Duration;

use curio_core::control::{FrameSource, InputEvent, JsonLineTransport, ScriptedInput};
use curio_core::{Controller, CurioConfig, Frame};

const WIDTH: usize = 32;
const HEIGHT: usize = 24;

/// Synthetic 30 fps camera.
struct DriftingBlob {
    tick: usize,
}

impl FrameSource for DriftingBlob {
    fn next_frame(&mut self) -> Option<Frame> {
        thread::sleep(Duration::from_millis(33));
        self.tick += 1;
        let t = self.tick as f64 * 0.15;
        let (cx, cy) = (
            WIDTH as f64 * (0.5 + 0.35 * t.cos()),
            HEIGHT as f64 * (0.5 + 0.35 * (1.3 * t).sin()),
        );
        Frame::from_fn(WIDTH, HEIGHT, |x, y| {
            let floor = if (x / 4 + y / 4) % 2 == 0 { 60 } else { 90 };
            let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
            let blob = 160.0 * (-d2 / 18.0).exp();
            (floor as f64 + blob).min(255.0) as u8
        })
        .ok()
    }
}

fn main() -> curio_core::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = CurioConfig::default();
    let controller = Controller::from_config(&config)?;

    let ms = Duration::from_millis;
    let press = |button| InputEvent::Button { button, pressed: true };
    let release = |button| InputEvent::Button { button, pressed: false };
    let mut joystick = ScriptedInput::new([
        (ms(0), InputEvent::DeviceAdded(0)),
        // Both sticks fully forward.
        (ms(100), InputEvent::Axis { axis: 1, value: -32768 }),
        (ms(100), InputEvent::Axis { axis: 4, value: -32768 }),
        (ms(1000), InputEvent::Axis { axis: 1, value: 0 }),
        (ms(1000), InputEvent::Axis { axis: 4, value: 0 }),
        // Hand over to the policy.
        (ms(1200), press(0)),
        (ms(1300), release(0)),
        (ms(2500), press(1)),
        (ms(2600), release(1)),
        (ms(2700), InputEvent::Unknown("hat 0 up".into())),
        (ms(5000), InputEvent::Quit),
    ]);

    let mut transport = JsonLineTransport::open(std::io::stdout())?;
    controller.run(&mut DriftingBlob { tick: 0 }, &mut joystick, &mut transport)?;
    eprintln!("sent {} commands", transport.sent());
    Ok(())
}

