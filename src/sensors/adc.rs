//! ADC-backed chamber instrumentation.
//!
//! Each quantity is a raw 12-bit conversion scaled by a single linear
//! factor. Channel layout and scale factors match the test-stand harness:
//!
//! | Quantity    | Channel           | Scale            |
//! |-------------|-------------------|------------------|
//! | temperature | `id + 0`          | 0.1 °C / count   |
//! | pressure    | `id + 4`          | 0.01 bar / count |
//! | flow rate   | `id + 8`          | 0.05 L/s / count |

use crate::app::ports::{ClockPort, SensorSource};
use crate::error::SensorError;
use crate::pins::{FLOW_ADC_BASE, PRESSURE_ADC_BASE, TEMPERATURE_ADC_BASE};

pub const TEMPERATURE_C_PER_COUNT: f32 = 0.1;
pub const PRESSURE_BAR_PER_COUNT: f32 = 0.01;
pub const FLOW_LPS_PER_COUNT: f32 = 0.05;

/// Largest count a 12-bit converter can produce.
pub const ADC_MAX: u16 = 4095;

/// Raw analogue-to-digital conversion, one channel at a time.
pub trait AdcPort {
    /// Configure channels. Called once from [`SensorSource::init`].
    fn init(&mut self) {}

    fn read(&mut self, channel: u8) -> Result<u16, SensorError>;
}

/// [`SensorSource`] over an [`AdcPort`] and a [`ClockPort`] for timestamps.
pub struct AdcSensorSource<A, C> {
    adc: A,
    clock: C,
}

impl<A: AdcPort, C: ClockPort> AdcSensorSource<A, C> {
    pub fn new(adc: A, clock: C) -> Self {
        Self { adc, clock }
    }

    fn read_scaled(&mut self, channel: u8, scale: f32) -> Result<f32, SensorError> {
        let raw = self.adc.read(channel)?;
        if raw > ADC_MAX {
            return Err(SensorError::OutOfRange);
        }
        Ok(f32::from(raw) * scale)
    }
}

impl<A: AdcPort, C: ClockPort> SensorSource for AdcSensorSource<A, C> {
    fn init(&mut self) {
        self.adc.init();
    }

    fn read_temperature(&mut self, id: u8) -> Result<f32, SensorError> {
        self.read_scaled(id.wrapping_add(TEMPERATURE_ADC_BASE), TEMPERATURE_C_PER_COUNT)
    }

    fn read_pressure(&mut self, id: u8) -> Result<f32, SensorError> {
        self.read_scaled(id.wrapping_add(PRESSURE_ADC_BASE), PRESSURE_BAR_PER_COUNT)
    }

    fn read_flow_rate(&mut self, id: u8) -> Result<f32, SensorError> {
        self.read_scaled(id.wrapping_add(FLOW_ADC_BASE), FLOW_LPS_PER_COUNT)
    }

    fn timestamp(&self) -> u32 {
        self.clock.now_ms() as u32
    }
}
