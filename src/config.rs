//! Controller configuration parameters
//!
//! Mission limits and run parameters set by the operator. The fixed
//! physical ceilings enforced by the engine model are NOT configurable and
//! live in [`crate::safety`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Mission configuration. Replaced as a whole; there is no per-field setter.
/// Fields missing from a serialized config take their default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Thrust setpoint for the regulation loop while running (N).
    pub target_thrust: f32,
    /// Highest chamber temperature the mission tolerates (°C, inclusive).
    pub max_temperature: f32,
    /// Highest chamber pressure the mission tolerates (bar, inclusive).
    pub max_pressure: f32,
    /// Planned burn duration (ms). `0` disables the timed shutdown.
    pub run_duration_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target_thrust: 1000.0,
            max_temperature: 180.0,
            max_pressure: 80.0,
            run_duration_ms: 5000,
        }
    }
}

impl ControllerConfig {
    /// Range-check every field.
    ///
    /// Rejects rather than clamps: a corrupted command channel must not be
    /// able to disable the mission limits with `NaN` or a negative value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_limit("target_thrust", self.target_thrust, true)?;
        check_limit("max_temperature", self.max_temperature, false)?;
        check_limit("max_pressure", self.max_pressure, false)?;
        Ok(())
    }
}

fn check_limit(field: &'static str, value: f32, allow_zero: bool) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite(field));
    }
    if value < 0.0 || (!allow_zero && value == 0.0) {
        return Err(ConfigError::OutOfRange(field));
    }
    Ok(())
}

/// Reasons a [`ControllerConfig`] is rejected. Carries the field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    NonFinite(&'static str),
    OutOfRange(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite(field) => write!(f, "{field} is not a finite number"),
            Self::OutOfRange(field) => write!(f, "{field} is out of range"),
        }
    }
}

impl core::error::Error for ConfigError {}
