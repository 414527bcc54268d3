//! Port traits: the boundary between the control core and the outside world.
//!
//! ```text
//!   SensorSource ──▶ EngineInterface ──▶ ActuationSink
//!                          ▲
//!                     EnginePort
//!                          │
//!   ClockPort ──────▶ Controller ──────▶ EventSink
//! ```
//!
//! Hardware adapters implement [`SensorSource`], [`ActuationSink`] and
//! [`ClockPort`]. The [`Controller`](super::service::Controller) reaches the
//! engine only through [`EnginePort`], so the state machine can be exercised
//! against a scripted engine as well as the real engine model.

use embedded_hal::digital::PinState;

use crate::engine::{EngineParameters, EngineStatus};
use crate::error::SensorError;
use crate::pins::CHAMBER_SENSOR_ID;
use crate::sensors::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor source (driven adapter: hardware → core)
// ───────────────────────────────────────────────────────────────

/// Read side: the engine model calls this to obtain chamber readings.
///
/// There is no "last good value" fallback. An unavailable transducer must
/// report an error so the safety checks can fail closed.
pub trait SensorSource {
    /// Bring up the acquisition hardware. Called from `EngineInterface::init`.
    fn init(&mut self) {}

    /// Temperature of sensor `id` (°C).
    fn read_temperature(&mut self, id: u8) -> Result<f32, SensorError>;

    /// Pressure of sensor `id` (bar).
    fn read_pressure(&mut self, id: u8) -> Result<f32, SensorError>;

    /// Flow rate of sensor `id` (L/s).
    fn read_flow_rate(&mut self, id: u8) -> Result<f32, SensorError>;

    /// Monotonic acquisition tick (ms, wraps).
    fn timestamp(&self) -> u32;

    /// Read the chamber instrumentation as one snapshot.
    fn snapshot(&mut self) -> Result<SensorSnapshot, SensorError> {
        let temperature = self.read_temperature(CHAMBER_SENSOR_ID)?;
        let pressure = self.read_pressure(CHAMBER_SENSOR_ID)?;
        let flow_rate = self.read_flow_rate(CHAMBER_SENSOR_ID)?;
        SensorSnapshot {
            temperature,
            pressure,
            flow_rate,
            timestamp: self.timestamp(),
        }
        .validated()
    }
}

// ───────────────────────────────────────────────────────────────
// Actuation sink (driven adapter: core → hardware)
// ───────────────────────────────────────────────────────────────

/// Write side: fire-and-forget actuation. No acknowledgement, no error.
pub trait ActuationSink {
    /// Drive a digital output line (valve solenoid, igniter).
    fn write_pin(&mut self, port: u8, pin: u8, state: PinState);

    /// Command the propellant flow proportion (0.0 – 1.0).
    fn set_flow_proportion(&mut self, proportion: f32);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Engine port (core ↔ engine model)
// ───────────────────────────────────────────────────────────────

/// What the controller needs from the engine model.
///
/// [`EngineInterface`](crate::engine::EngineInterface) is the production
/// implementation.
pub trait EnginePort {
    /// Reset status and throttle, initialize sensing. Idempotent.
    fn init(&mut self);

    /// Safety-gated start: `Running` with valves open, or `Fault`.
    fn start(&mut self);

    /// Close every valve, zero the throttle, status `Shutdown`.
    fn stop(&mut self);

    /// Clamp to [0, 100] % and command the flow proportion.
    fn set_throttle(&mut self, percent: f32);

    /// Last stored throttle (%).
    fn throttle(&self) -> f32;

    /// Fresh parameters derived from one new snapshot.
    fn parameters(&mut self) -> Result<EngineParameters, SensorError>;

    fn status(&self) -> EngineStatus;

    /// Fixed-ceiling evaluation of one fresh snapshot, as a
    /// [`SafetyFault`](crate::error::SafetyFault) bitmask (0 = safe).
    fn safety_faults(&mut self) -> u8;

    /// `true` when [`safety_faults`](Self::safety_faults) reports nothing.
    fn check_safety(&mut self) -> bool {
        self.safety_faults() == 0
    }

    /// Fire the igniter for its fixed pulse width. Blocks for the pulse.
    fn trigger_ignition(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`ControllerEvent`](super::events::ControllerEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ControllerEvent);
}

