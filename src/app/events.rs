//! Outbound controller events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to console, downlink as telemetry,
//! record for a test.

use crate::engine::EngineParameters;
use crate::error::SensorError;
use crate::fsm::{ControllerState, GuardedCommand};

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Per-cycle telemetry, pulled at the start of `run()`.
    Telemetry(TelemetryData),

    /// The state machine moved between states.
    StateChanged {
        from: ControllerState,
        to: ControllerState,
    },

    /// A health evaluation failed (carries the `SafetyFault` bitmask).
    HealthCheckFailed(u8),

    /// Emergency shutdown forced the controller into `Error`.
    EmergencyShutdown { from: ControllerState },

    /// A guarded command was rejected in the current state.
    CommandRejected {
        command: GuardedCommand,
        state: ControllerState,
    },

    /// Telemetry refresh could not read the chamber instrumentation.
    SensorUnavailable(SensorError),

    /// `init()` completed (carries the resulting state).
    Started(ControllerState),
}

/// A point-in-time telemetry record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub state: ControllerState,
    pub parameters: EngineParameters,
    /// Commanded throttle (%).
    pub throttle: f32,
    pub fault_flags: u8,
    pub timestamp_ms: u64,
}
