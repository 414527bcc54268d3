//! Safety interlocks.
//!
//! Two independent layers:
//!
//! 1. **Hard ceilings** ([`hard_limit_faults`]): fixed physical limits of
//!    the test article, evaluated by the engine model. Never read from
//!    configuration.
//! 2. **Mission limits** ([`mission_limit_faults`]): the operator's
//!    configured maxima, evaluated by the controller's health check.
//!
//! The [`HealthMonitor`] combines both into one latched fault bitmask and
//! logs every bit as it is raised and cleared.
//!
//! All comparisons are strict `>`: a reading exactly at a limit is healthy.

use log::{error, info};

use crate::config::ControllerConfig;
use crate::engine::EngineParameters;
use crate::error::{SafetyFault, SensorError};
use crate::sensors::SensorSnapshot;

/// Chamber temperature the hardware must never exceed (°C).
pub const HARD_MAX_TEMPERATURE_C: f32 = 200.0;
/// Chamber pressure the hardware must never exceed (bar).
pub const HARD_MAX_PRESSURE_BAR: f32 = 100.0;

/// Evaluate one snapshot against the fixed ceilings.
pub fn hard_limit_faults(snap: &SensorSnapshot) -> u8 {
    let mut faults = 0;
    if snap.temperature > HARD_MAX_TEMPERATURE_C {
        faults |= SafetyFault::HardOverTemperature.mask();
    }
    if snap.pressure > HARD_MAX_PRESSURE_BAR {
        faults |= SafetyFault::HardOverPressure.mask();
    }
    faults
}

/// Evaluate engine parameters against the configured mission limits.
pub fn mission_limit_faults(params: &EngineParameters, config: &ControllerConfig) -> u8 {
    let mut faults = 0;
    if params.chamber_temperature > config.max_temperature {
        faults |= SafetyFault::OverTemperature.mask();
    }
    if params.chamber_pressure > config.max_pressure {
        faults |= SafetyFault::OverPressure.mask();
    }
    faults
}

/// Fault mask for a failed sensor acquisition.
pub fn sensor_faults(_err: SensorError) -> u8 {
    SafetyFault::SensorUnavailable.mask()
}

/// Combines both layers and remembers the last result.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    /// Fault bitmask from the most recent evaluation.
    faults: u8,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self { faults: 0 }
    }

    /// Evaluate one health check.
    ///
    /// * `engine_faults`: the engine model's hard-ceiling result.
    /// * `params`: freshly derived parameters, or the acquisition error.
    ///
    /// Returns the updated fault bitmask (0 = healthy).
    pub fn evaluate(
        &mut self,
        engine_faults: u8,
        params: Result<&EngineParameters, SensorError>,
        config: &ControllerConfig,
    ) -> u8 {
        let mission = match params {
            Ok(p) => mission_limit_faults(p, config),
            Err(e) => sensor_faults(e),
        };
        let current = engine_faults | mission;

        for fault in SafetyFault::ALL {
            let was = fault.is_set(self.faults);
            let now = fault.is_set(current);
            if now && !was {
                error!("SAFETY FAULT SET: {fault}");
            } else if was && !now {
                info!("SAFETY FAULT CLEARED: {fault}");
            }
        }

        self.faults = current;
        current
    }

    /// Fault bitmask from the most recent evaluation.
    pub fn faults(&self) -> u8 {
        self.faults
    }
}
