//! Unified error types for the engine control unit.
//!
//! A single `Error` enum that every subsystem can convert into. All variants
//! are `Copy` so they can be passed through the health monitor and the FSM
//! context without allocation.

use core::fmt;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// A configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Reasons a sensor reading is unavailable. Any of these is a safety-check
/// failure; a missing reading is never replaced by a plausible default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC conversion failed or timed out.
    AdcReadFailed,
    /// The transducer is not responding.
    Unavailable,
    /// Reading is non-finite or outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::Unavailable => write!(f, "sensor unavailable"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl core::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Individual reasons a safety or health check failed.
///
/// Accumulated in a `u8` bitfield so that simultaneous violations are all
/// reported. The first two bits come from the engine model's fixed
/// ceilings; the next two from the controller's configured mission limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// Chamber temperature above the fixed physical ceiling.
    HardOverTemperature = 0b0000_0001,
    /// Chamber pressure above the fixed physical ceiling.
    HardOverPressure = 0b0000_0010,
    /// Chamber temperature above the configured mission limit.
    OverTemperature = 0b0000_0100,
    /// Chamber pressure above the configured mission limit.
    OverPressure = 0b0000_1000,
    /// A sensor reading could not be obtained.
    SensorUnavailable = 0b0001_0000,
}

impl SafetyFault {
    pub const ALL: [SafetyFault; 5] = [
        Self::HardOverTemperature,
        Self::HardOverPressure,
        Self::OverTemperature,
        Self::OverPressure,
        Self::SensorUnavailable,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// True if this fault's bit is set in `flags`.
    pub const fn is_set(self, flags: u8) -> bool {
        flags & self.mask() != 0
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardOverTemperature => write!(f, "temperature above hard ceiling"),
            Self::HardOverPressure => write!(f, "pressure above hard ceiling"),
            Self::OverTemperature => write!(f, "temperature above mission limit"),
            Self::OverPressure => write!(f, "pressure above mission limit"),
            Self::SensorUnavailable => write!(f, "sensor unavailable"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
