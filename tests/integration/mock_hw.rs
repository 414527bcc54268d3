//! Mock hardware for integration tests.
//!
//! One shared [`MockStand`] backs the sensor, actuator, delay and clock
//! mocks, so a test can script readings and inspect the full actuation
//! history while the engine model owns the port handles.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use hotfire::app::events::ControllerEvent;
use hotfire::app::ports::{ActuationSink, ClockPort, EventSink, SensorSource};
use hotfire::app::service::Controller;
use hotfire::engine::EngineInterface;
use hotfire::error::SensorError;

// ── Actuation record ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuationCall {
    Pin { port: u8, pin: u8, state: PinState },
    FlowProportion(f32),
    Delay { ns: u32 },
}

#[derive(Debug)]
pub struct StandState {
    pub temperature: f32,
    pub pressure: f32,
    pub flow_rate: f32,
    pub sensor_error: Option<SensorError>,
    pub calls: Vec<ActuationCall>,
    pub sensor_inits: u32,
}

// ── MockStand ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockStand {
    state: Rc<RefCell<StandState>>,
    clock: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl MockStand {
    /// Cold chamber at ambient pressure.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(StandState {
                temperature: 25.0,
                pressure: 1.0,
                flow_rate: 0.0,
                sensor_error: None,
                calls: Vec::new(),
                sensor_inits: 0,
            })),
            clock: Rc::new(Cell::new(0)),
        }
    }

    pub fn set_readings(&self, temperature: f32, pressure: f32) {
        let mut s = self.state.borrow_mut();
        s.temperature = temperature;
        s.pressure = pressure;
    }

    pub fn fail_sensors(&self, error: Option<SensorError>) {
        self.state.borrow_mut().sensor_error = error;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.clock.set(self.clock.get() + ms);
    }

    pub fn calls(&self) -> Vec<ActuationCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn sensor_inits(&self) -> u32 {
        self.state.borrow().sensor_inits
    }

    /// Last level written to `port`/`pin`, if any.
    pub fn pin_level(&self, port: u8, pin: u8) -> Option<PinState> {
        self.state.borrow().calls.iter().rev().find_map(|c| match *c {
            ActuationCall::Pin {
                port: p,
                pin: n,
                state,
            } if p == port && n == pin => Some(state),
            _ => None,
        })
    }

    pub fn last_flow_proportion(&self) -> Option<f32> {
        self.state.borrow().calls.iter().rev().find_map(|c| match *c {
            ActuationCall::FlowProportion(p) => Some(p),
            _ => None,
        })
    }

    pub fn sensors(&self) -> MockSensors {
        MockSensors(self.clone())
    }

    pub fn actuators(&self) -> MockActuators {
        MockActuators(self.clone())
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay(self.clone())
    }

    pub fn clock(&self) -> MockClock {
        MockClock(Rc::clone(&self.clock))
    }

    pub fn engine(&self) -> MockEngine {
        EngineInterface::new(self.sensors(), self.actuators(), self.delay())
    }

    pub fn controller(&self) -> Controller<MockEngine, MockClock> {
        Controller::new(self.engine(), self.clock())
    }
}

impl Default for MockStand {
    fn default() -> Self {
        Self::new()
    }
}

pub type MockEngine = EngineInterface<MockSensors, MockActuators, MockDelay>;

// ── Port implementations ──────────────────────────────────────

pub struct MockSensors(MockStand);

impl MockSensors {
    fn read(&self, pick: impl Fn(&StandState) -> f32) -> Result<f32, SensorError> {
        let s = self.0.state.borrow();
        match s.sensor_error {
            Some(e) => Err(e),
            None => Ok(pick(&*s)),
        }
    }
}

impl SensorSource for MockSensors {
    fn init(&mut self) {
        self.0.state.borrow_mut().sensor_inits += 1;
    }

    fn read_temperature(&mut self, _id: u8) -> Result<f32, SensorError> {
        self.read(|s| s.temperature)
    }

    fn read_pressure(&mut self, _id: u8) -> Result<f32, SensorError> {
        self.read(|s| s.pressure)
    }

    fn read_flow_rate(&mut self, _id: u8) -> Result<f32, SensorError> {
        self.read(|s| s.flow_rate)
    }

    fn timestamp(&self) -> u32 {
        self.0.clock.get() as u32
    }
}

pub struct MockActuators(MockStand);

impl ActuationSink for MockActuators {
    fn write_pin(&mut self, port: u8, pin: u8, state: PinState) {
        self.0
            .state
            .borrow_mut()
            .calls
            .push(ActuationCall::Pin { port, pin, state });
    }

    fn set_flow_proportion(&mut self, proportion: f32) {
        self.0
            .state
            .borrow_mut()
            .calls
            .push(ActuationCall::FlowProportion(proportion));
    }
}

/// Records pulse widths instead of sleeping.
pub struct MockDelay(MockStand);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0
            .state
            .borrow_mut()
            .calls
            .push(ActuationCall::Delay { ns });
    }
}

pub struct MockClock(Rc<Cell<u64>>);

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<ControllerEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(event.clone());
    }
}
