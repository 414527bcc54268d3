//! Host time adapter.
//!
//! Monotonic milliseconds for [`ClockPort`] and a blocking [`DelayNs`] for
//! the igniter pulse, both backed by `std`. Clones share one epoch so the
//! sensor timestamps and the controller clock agree.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::app::ports::ClockPort;

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl ClockPort for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Thread-sleep delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
