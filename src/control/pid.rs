//! PID controller for chamber thrust.
//!
//! Closes the loop between measured thrust and the configured target by
//! commanding throttle percent. Output is clamped; integration is frozen
//! while the output sits on a limit.

/// Default gains, in throttle-percent per newton of thrust error.
pub const THRUST_KP: f32 = 0.02;
pub const THRUST_KI: f32 = 0.01;
pub const THRUST_KD: f32 = 0.0;

pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: Option<f32>,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint,
            integral: 0.0,
            prev_error: None,
            output_min: 0.0,
            output_max: 100.0,
        }
    }

    /// Gains tuned for thrust → throttle percent, output in [0, 100].
    pub fn for_thrust(target_thrust: f32) -> Self {
        Self::new(THRUST_KP, THRUST_KI, THRUST_KD, target_thrust)
    }

    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    /// One control step. `dt` in seconds; a zero step skips I and D.
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;

        let p = self.kp * error;

        if dt > 0.0 {
            self.integral += error * dt;
        }
        let i = self.ki * self.integral;

        let d = match self.prev_error {
            Some(prev) if dt > 0.0 => self.kd * (error - prev) / dt,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let unclamped = p + i + d;
        let output = unclamped.clamp(self.output_min, self.output_max);

        // Anti-windup
        if output != unclamped && dt > 0.0 {
            self.integral -= error * dt;
        }

        output
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}
