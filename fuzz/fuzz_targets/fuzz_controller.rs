//! Fuzz target: `Controller` command / reading sequences
//!
//! Each input byte pair is one step: an operator command, an emergency
//! shutdown, a config replacement, or a control cycle with arbitrary
//! chamber readings (including NaN, infinities and sensor outages).
//! Asserts that the controller never panics, that Error is absorbing, and
//! that the engine is never left running once the controller is in Error.
//!
//! cargo fuzz run fuzz_controller

#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use libfuzzer_sys::fuzz_target;

use hotfire::app::commands::OperatorCommand;
use hotfire::app::events::ControllerEvent;
use hotfire::app::ports::{ActuationSink, ClockPort, EventSink, SensorSource};
use hotfire::app::service::Controller;
use hotfire::config::ControllerConfig;
use hotfire::engine::{EngineInterface, EngineStatus};
use hotfire::error::SensorError;
use hotfire::fsm::ControllerState;

#[derive(Clone, Copy)]
struct Reading {
    temperature: f32,
    pressure: f32,
    dead: bool,
}

struct Sensors(Rc<Cell<Reading>>);

impl Sensors {
    fn get(&self, f: fn(&Reading) -> f32) -> Result<f32, SensorError> {
        let r = self.0.get();
        if r.dead {
            Err(SensorError::Unavailable)
        } else {
            Ok(f(&r))
        }
    }
}

impl SensorSource for Sensors {
    fn read_temperature(&mut self, _id: u8) -> Result<f32, SensorError> {
        self.get(|r| r.temperature)
    }
    fn read_pressure(&mut self, _id: u8) -> Result<f32, SensorError> {
        self.get(|r| r.pressure)
    }
    fn read_flow_rate(&mut self, _id: u8) -> Result<f32, SensorError> {
        Ok(1.0)
    }
    fn timestamp(&self) -> u32 {
        0
    }
}

struct Sink;

impl ActuationSink for Sink {
    fn write_pin(&mut self, _port: u8, _pin: u8, _state: PinState) {}
    fn set_flow_proportion(&mut self, proportion: f32) {
        assert!((0.0..=1.0).contains(&proportion), "flow proportion {proportion}");
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

struct Clock(Rc<Cell<u64>>);

impl ClockPort for Clock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &ControllerEvent) {}
}

fn reading_value(byte: u8) -> f32 {
    match byte {
        0xFD => f32::NAN,
        0xFE => f32::INFINITY,
        0xFF => f32::NEG_INFINITY,
        b => f32::from(b),
    }
}

fuzz_target!(|data: &[u8]| {
    let reading = Rc::new(Cell::new(Reading {
        temperature: 25.0,
        pressure: 1.0,
        dead: false,
    }));
    let now = Rc::new(Cell::new(0u64));
    let engine = EngineInterface::new(Sensors(Rc::clone(&reading)), Sink, NoDelay);
    let mut ctl = Controller::new(engine, Clock(Rc::clone(&now)));
    ctl.init(&mut Discard);

    for pair in data.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        let was_error = ctl.state() == ControllerState::Error;

        match op % 8 {
            0 => {
                ctl.arm(&mut Discard);
            }
            1 => {
                ctl.disarm(&mut Discard);
            }
            2 => {
                ctl.start_engine(&mut Discard);
            }
            3 => {
                ctl.stop_engine(&mut Discard);
            }
            4 => ctl.emergency_shutdown(&mut Discard),
            5 => {
                let cfg = ControllerConfig {
                    max_temperature: reading_value(arg),
                    max_pressure: reading_value(arg.rotate_left(3)),
                    run_duration_ms: u32::from(arg) * 10,
                    ..ControllerConfig::default()
                };
                ctl.handle_command(OperatorCommand::SetConfig(cfg), &mut Discard);
                assert!(ctl.config().validate().is_ok());
            }
            6 => {
                reading.set(Reading {
                    temperature: reading_value(arg),
                    pressure: reading_value(arg.rotate_left(4)),
                    dead: arg & 0x80 != 0 && arg & 1 != 0,
                });
            }
            _ => {
                now.set(now.get() + u64::from(arg));
                ctl.run(&mut Discard);
            }
        }

        if was_error {
            assert_eq!(ctl.state(), ControllerState::Error);
        }
        if ctl.state() == ControllerState::Error {
            assert_eq!(ctl.engine().status(), EngineStatus::Shutdown);
        }
        let throttle = ctl.engine().throttle();
        assert!((0.0..=100.0).contains(&throttle));
    }
});
