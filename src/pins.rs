//! Actuation line and sensor channel assignments for the test-stand ECU.
//!
//! Single source of truth: the engine model and the ADC sensor source
//! reference this module rather than hard-coding port/pin numbers.

// ---------------------------------------------------------------------------
// Main propellant valves (solenoid drivers on GPIO port 0)
// ---------------------------------------------------------------------------

/// GPIO port carrying the valve solenoid drivers.
pub const VALVE_PORT: u8 = 0;
/// Fuel main valve. HIGH = open.
pub const FUEL_MAIN_VALVE: u8 = 0;
/// Oxidizer main valve. HIGH = open.
pub const OXIDIZER_MAIN_VALVE: u8 = 1;

/// Every valve the engine model commands closed on shutdown.
pub const CONTROLLED_VALVES: [u8; 2] = [FUEL_MAIN_VALVE, OXIDIZER_MAIN_VALVE];

// ---------------------------------------------------------------------------
// Igniter
// ---------------------------------------------------------------------------

/// GPIO port carrying the igniter firing line.
pub const IGNITER_PORT: u8 = 0;
/// Igniter firing line. HIGH = energised.
pub const IGNITER_PIN: u8 = 10;
/// Igniter pulse width. Fixed; the pulse is never shortened or interrupted.
pub const IGNITION_PULSE_MS: u32 = 50;

// ---------------------------------------------------------------------------
// Sensors: ADC channel layout
// ---------------------------------------------------------------------------

/// Sensor id of the combustion-chamber instrumentation.
pub const CHAMBER_SENSOR_ID: u8 = 0;

/// Temperature transducers occupy ADC channels `id + 0`.
pub const TEMPERATURE_ADC_BASE: u8 = 0;
/// Pressure transducers occupy ADC channels `id + 4`.
pub const PRESSURE_ADC_BASE: u8 = 4;
/// Flow meters occupy ADC channels `id + 8`.
pub const FLOW_ADC_BASE: u8 = 8;
