//! Engine model.
//!
//! Translates engine intents (start, stop, throttle, ignition) into
//! actuation commands, aggregates sensor readings into
//! [`EngineParameters`], and enforces the fixed physical safety ceilings.
//!
//! ```text
//!             start() ── safe ──▶ Ready ─▶ Running   (valves open, igniter pulsed)
//!   Idle ─────┤
//!             └── unsafe ──▶ Fault                   (no actuation)
//!
//!   any ── stop() ──▶ Shutdown                        (valves closed, throttle 0)
//! ```
//!
//! The status is owned here and changed only by this type's own
//! operations.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ActuationSink, EnginePort, SensorSource};
use crate::error::SensorError;
use crate::pins::{
    CONTROLLED_VALVES, FUEL_MAIN_VALVE, IGNITER_PIN, IGNITER_PORT, IGNITION_PULSE_MS,
    OXIDIZER_MAIN_VALVE, VALVE_PORT,
};
use crate::safety::{self, hard_limit_faults};
use crate::sensors::SensorSnapshot;

/// Thrust per unit chamber pressure (N/bar).
pub const THRUST_PER_BAR: f32 = 10.0;
/// Oxidizer flow as a fraction of the measured propellant flow.
pub const OXIDIZER_FLOW_RATIO: f32 = 0.8;

/// Operational status of the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineStatus {
    Idle,
    Ready,
    Running,
    Fault,
    Shutdown,
}

/// Engine state derived from one snapshot. Recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    /// °C
    pub chamber_temperature: f32,
    /// bar
    pub chamber_pressure: f32,
    /// L/s
    pub fuel_flow_rate: f32,
    /// L/s
    pub oxidizer_flow_rate: f32,
    /// N
    pub thrust: f32,
    pub status: EngineStatus,
}

impl EngineParameters {
    pub fn derive(snap: &SensorSnapshot, status: EngineStatus) -> Self {
        Self {
            chamber_temperature: snap.temperature,
            chamber_pressure: snap.pressure,
            fuel_flow_rate: snap.flow_rate,
            oxidizer_flow_rate: snap.flow_rate * OXIDIZER_FLOW_RATIO,
            thrust: snap.pressure * THRUST_PER_BAR,
            status,
        }
    }
}

/// The engine model, generic over its three hardware collaborators.
pub struct EngineInterface<S, A, D> {
    sensors: S,
    actuators: A,
    delay: D,
    status: EngineStatus,
    /// Commanded throttle (%), always within [0, 100].
    throttle: f32,
}

impl<S, A, D> EngineInterface<S, A, D>
where
    S: SensorSource,
    A: ActuationSink,
    D: DelayNs,
{
    pub fn new(sensors: S, actuators: A, delay: D) -> Self {
        Self {
            sensors,
            actuators,
            delay,
            status: EngineStatus::Idle,
            throttle: 0.0,
        }
    }

    /// Reset status and throttle and bring up the sensor subsystem.
    pub fn init(&mut self) {
        self.sensors.init();
        self.status = EngineStatus::Idle;
        self.throttle = 0.0;
        info!("engine: initialized");
    }

    /// Safety-gated start.
    ///
    /// The `Ready` step is internal: callers observe either `Running` or
    /// `Fault` once this returns.
    pub fn start(&mut self) {
        let faults = self.safety_faults();
        if faults != 0 {
            self.status = EngineStatus::Fault;
            warn!("engine: start refused, safety faults=0b{:08b}", faults);
            return;
        }

        self.status = EngineStatus::Ready;
        self.open_valve(FUEL_MAIN_VALVE);
        self.open_valve(OXIDIZER_MAIN_VALVE);
        self.trigger_ignition();
        self.status = EngineStatus::Running;
        info!("engine: running");
    }

    /// Close every controlled valve and zero the throttle. Always succeeds.
    pub fn stop(&mut self) {
        for valve in CONTROLLED_VALVES {
            self.close_valve(valve);
        }
        self.throttle = 0.0;
        self.status = EngineStatus::Shutdown;
        debug!("engine: shut down");
    }

    pub fn set_throttle(&mut self, percent: f32) {
        let clamped = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        self.throttle = clamped;
        self.actuators.set_flow_proportion(clamped / 100.0);
    }

    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    pub fn parameters(&mut self) -> Result<EngineParameters, SensorError> {
        let snap = self.read_snapshot()?;
        Ok(EngineParameters::derive(&snap, self.status))
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// Hard-ceiling check on a fresh snapshot. An unreadable sensor fails.
    pub fn check_safety(&mut self) -> bool {
        self.safety_faults() == 0
    }

    /// Same evaluation as [`check_safety`](Self::check_safety), itemised.
    pub fn safety_faults(&mut self) -> u8 {
        match self.read_snapshot() {
            Ok(snap) => hard_limit_faults(&snap),
            Err(e) => safety::sensor_faults(e),
        }
    }

    pub fn open_valve(&mut self, valve_id: u8) {
        self.actuators.write_pin(VALVE_PORT, valve_id, PinState::High);
    }

    pub fn close_valve(&mut self, valve_id: u8) {
        self.actuators.write_pin(VALVE_PORT, valve_id, PinState::Low);
    }

    /// Pulse the igniter line for [`IGNITION_PULSE_MS`].
    ///
    /// Blocking. `&mut self` guarantees nothing else reaches the actuators
    /// until the line is de-asserted.
    pub fn trigger_ignition(&mut self) {
        self.actuators.write_pin(IGNITER_PORT, IGNITER_PIN, PinState::High);
        self.delay.delay_ms(IGNITION_PULSE_MS);
        self.actuators.write_pin(IGNITER_PORT, IGNITER_PIN, PinState::Low);
        debug!("engine: igniter pulsed {} ms", IGNITION_PULSE_MS);
    }

    /// Borrow the actuation sink (test benches inspect recorded commands).
    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    fn read_snapshot(&mut self) -> Result<SensorSnapshot, SensorError> {
        // Validate again: a source may override `snapshot()`.
        self.sensors.snapshot().and_then(SensorSnapshot::validated)
    }
}

impl<S, A, D> EnginePort for EngineInterface<S, A, D>
where
    S: SensorSource,
    A: ActuationSink,
    D: DelayNs,
{
    fn init(&mut self) {
        EngineInterface::init(self);
    }

    fn start(&mut self) {
        EngineInterface::start(self);
    }

    fn stop(&mut self) {
        EngineInterface::stop(self);
    }

    fn set_throttle(&mut self, percent: f32) {
        EngineInterface::set_throttle(self, percent);
    }

    fn throttle(&self) -> f32 {
        EngineInterface::throttle(self)
    }

    fn parameters(&mut self) -> Result<EngineParameters, SensorError> {
        EngineInterface::parameters(self)
    }

    fn status(&self) -> EngineStatus {
        EngineInterface::status(self)
    }

    fn safety_faults(&mut self) -> u8 {
        EngineInterface::safety_faults(self)
    }

    fn trigger_ignition(&mut self) {
        EngineInterface::trigger_ignition(self);
    }
}
