//! Simulated test stand.
//!
//! A first-order plant standing in for the engine on the bench: valves and
//! igniter come in through [`ActuationSink`], chamber readings go out as raw
//! 12-bit counts through [`AdcPort`], so the real [`AdcSensorSource`] scaling
//! path is exercised end to end.
//!
//! The engine lights when the igniter fires with both main valves open, and
//! goes out as soon as either valve closes. While lit, chamber pressure and
//! temperature settle toward values proportional to the commanded flow.
//!
//! [`AdcSensorSource`]: crate::sensors::AdcSensorSource

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::PinState;
use log::debug;

use crate::app::ports::ActuationSink;
use crate::error::SensorError;
use crate::pins::{
    CHAMBER_SENSOR_ID, FLOW_ADC_BASE, FUEL_MAIN_VALVE, IGNITER_PIN, IGNITER_PORT,
    OXIDIZER_MAIN_VALVE, PRESSURE_ADC_BASE, TEMPERATURE_ADC_BASE, VALVE_PORT,
};
use crate::sensors::adc::{
    ADC_MAX, AdcPort, FLOW_LPS_PER_COUNT, PRESSURE_BAR_PER_COUNT, TEMPERATURE_C_PER_COUNT,
};

const AMBIENT_TEMPERATURE_C: f32 = 20.0;
const AMBIENT_PRESSURE_BAR: f32 = 1.0;
/// Chamber pressure rise at full flow (bar).
const FULL_FLOW_PRESSURE_RISE_BAR: f32 = 36.0;
/// Chamber temperature rise at full flow (°C).
const FULL_FLOW_TEMPERATURE_RISE_C: f32 = 140.0;
/// Propellant flow at full throttle (L/s).
const FULL_FLOW_LPS: f32 = 40.0;
/// Plant time constant (s).
const TIME_CONSTANT_S: f32 = 0.25;

#[derive(Debug)]
struct Plant {
    fuel_open: bool,
    oxidizer_open: bool,
    lit: bool,
    proportion: f32,
    temperature: f32,
    pressure: f32,
    flow: f32,
    sensor_fault: bool,
}

impl Plant {
    fn valves_open(&self) -> bool {
        self.fuel_open && self.oxidizer_open
    }
}

/// Owner of the shared plant. Hand [`adc`](Self::adc) and
/// [`actuators`](Self::actuators) to the engine model, keep this handle to
/// advance the physics and inject faults.
#[derive(Debug, Clone)]
pub struct SimulatedTestStand {
    plant: Rc<RefCell<Plant>>,
}

impl Default for SimulatedTestStand {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTestStand {
    pub fn new() -> Self {
        Self {
            plant: Rc::new(RefCell::new(Plant {
                fuel_open: false,
                oxidizer_open: false,
                lit: false,
                proportion: 0.0,
                temperature: AMBIENT_TEMPERATURE_C,
                pressure: AMBIENT_PRESSURE_BAR,
                flow: 0.0,
                sensor_fault: false,
            })),
        }
    }

    pub fn adc(&self) -> SimAdc {
        SimAdc {
            plant: Rc::clone(&self.plant),
        }
    }

    pub fn actuators(&self) -> SimActuators {
        SimActuators {
            plant: Rc::clone(&self.plant),
        }
    }

    /// Advance the plant by `dt_secs`.
    pub fn step(&self, dt_secs: f32) {
        let p = &mut *self.plant.borrow_mut();
        if !p.valves_open() {
            p.lit = false;
        }

        let flow_target = if p.valves_open() {
            FULL_FLOW_LPS * p.proportion
        } else {
            0.0
        };
        let (pressure_target, temperature_target) = if p.lit {
            (
                AMBIENT_PRESSURE_BAR + FULL_FLOW_PRESSURE_RISE_BAR * p.proportion,
                AMBIENT_TEMPERATURE_C + FULL_FLOW_TEMPERATURE_RISE_C * p.proportion,
            )
        } else {
            (AMBIENT_PRESSURE_BAR, AMBIENT_TEMPERATURE_C)
        };

        let alpha = if dt_secs > 0.0 {
            dt_secs / (TIME_CONSTANT_S + dt_secs)
        } else {
            0.0
        };
        p.flow += (flow_target - p.flow) * alpha;
        p.pressure += (pressure_target - p.pressure) * alpha;
        p.temperature += (temperature_target - p.temperature) * alpha;
    }

    /// Make every ADC conversion fail until cleared.
    pub fn set_sensor_fault(&self, fault: bool) {
        self.plant.borrow_mut().sensor_fault = fault;
    }

    pub fn is_lit(&self) -> bool {
        self.plant.borrow().lit
    }

    pub fn chamber_pressure(&self) -> f32 {
        self.plant.borrow().pressure
    }
}

/// ADC view of the plant.
#[derive(Debug)]
pub struct SimAdc {
    plant: Rc<RefCell<Plant>>,
}

fn to_counts(value: f32, per_count: f32) -> u16 {
    (value / per_count).round().clamp(0.0, f32::from(ADC_MAX)) as u16
}

impl AdcPort for SimAdc {
    fn read(&mut self, channel: u8) -> Result<u16, SensorError> {
        let p = self.plant.borrow();
        if p.sensor_fault {
            return Err(SensorError::AdcReadFailed);
        }
        match channel.wrapping_sub(CHAMBER_SENSOR_ID) {
            TEMPERATURE_ADC_BASE => Ok(to_counts(p.temperature, TEMPERATURE_C_PER_COUNT)),
            PRESSURE_ADC_BASE => Ok(to_counts(p.pressure, PRESSURE_BAR_PER_COUNT)),
            FLOW_ADC_BASE => Ok(to_counts(p.flow, FLOW_LPS_PER_COUNT)),
            _ => Err(SensorError::Unavailable),
        }
    }
}

/// Valve, igniter and flow-control view of the plant.
#[derive(Debug)]
pub struct SimActuators {
    plant: Rc<RefCell<Plant>>,
}

impl ActuationSink for SimActuators {
    fn write_pin(&mut self, port: u8, pin: u8, state: PinState) {
        let p = &mut *self.plant.borrow_mut();
        let high = state == PinState::High;
        match (port, pin) {
            (VALVE_PORT, FUEL_MAIN_VALVE) => p.fuel_open = high,
            (VALVE_PORT, OXIDIZER_MAIN_VALVE) => p.oxidizer_open = high,
            (IGNITER_PORT, IGNITER_PIN) => {
                if high && p.valves_open() {
                    p.lit = true;
                }
            }
            _ => debug!("sim: write to unmapped line {}.{}", port, pin),
        }
    }

    fn set_flow_proportion(&mut self, proportion: f32) {
        self.plant.borrow_mut().proportion = proportion.clamp(0.0, 1.0);
    }
}
