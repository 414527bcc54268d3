//! Sensor data model and the ADC-backed [`SensorSource`] implementation.
//!
//! The engine model never reads hardware itself: it asks a
//! [`SensorSource`] for a [`SensorSnapshot`] every time it needs one.

pub mod adc;

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

pub use adc::{AdcPort, AdcSensorSource};

/// A point-in-time reading of the chamber instrumentation.
///
/// Immutable once produced; a fresh one is acquired on every request.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Chamber temperature (°C).
    pub temperature: f32,
    /// Chamber pressure (bar).
    pub pressure: f32,
    /// Propellant flow rate (L/s).
    pub flow_rate: f32,
    /// Monotonic acquisition tick (ms, wraps).
    pub timestamp: u32,
}

impl SensorSnapshot {
    /// Reject snapshots carrying non-finite values.
    ///
    /// `NaN` compares false against every limit, so it would otherwise pass
    /// the `>` ceiling checks as if it were a safe reading.
    pub fn validated(self) -> Result<Self, SensorError> {
        if self.temperature.is_finite() && self.pressure.is_finite() && self.flow_rate.is_finite()
        {
            Ok(self)
        } else {
            Err(SensorError::OutOfRange)
        }
    }
}
