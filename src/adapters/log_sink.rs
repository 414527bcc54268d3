//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to the
//! `log` facade (console on the host, UART on the stand computer). A
//! telemetry downlink adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControllerEvent`].
pub struct LogEventSink {
    /// Log one telemetry line every `telemetry_every` cycles (0 = never).
    telemetry_every: u32,
    telemetry_seen: u32,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::with_telemetry_decimation(1)
    }

    /// Telemetry arrives every cycle; thin it out for a readable console.
    pub fn with_telemetry_decimation(every: u32) -> Self {
        Self {
            telemetry_every: every,
            telemetry_seen: 0,
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Telemetry(t) => {
                if self.telemetry_every == 0 {
                    return;
                }
                self.telemetry_seen = self.telemetry_seen.wrapping_add(1);
                if self.telemetry_seen % self.telemetry_every != 0 {
                    return;
                }
                let p = &t.parameters;
                info!(
                    "TELEM | t={}ms | state={:?} | engine={:?} | T={:.1}\u{00b0}C P={:.2}bar | \
                     fuel={:.2} ox={:.2} L/s | thrust={:.0}N | throttle={:.1}% | faults=0b{:08b}",
                    t.timestamp_ms,
                    t.state,
                    p.status,
                    p.chamber_temperature,
                    p.chamber_pressure,
                    p.fuel_flow_rate,
                    p.oxidizer_flow_rate,
                    p.thrust,
                    t.throttle,
                    t.fault_flags,
                );
            }
            ControllerEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            ControllerEvent::HealthCheckFailed(flags) => {
                error!("HEALTH | check failed, faults=0b{:08b}", flags);
            }
            ControllerEvent::EmergencyShutdown { from } => {
                error!("ESTOP | emergency shutdown from {:?}", from);
            }
            ControllerEvent::CommandRejected { command, state } => {
                warn!("CMD | {:?} rejected in {:?}", command, state);
            }
            ControllerEvent::SensorUnavailable(e) => {
                warn!("SENSOR | {}", e);
            }
            ControllerEvent::Started(state) => {
                info!("START | state={:?}", state);
            }
        }
    }
}
