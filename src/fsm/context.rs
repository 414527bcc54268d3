//! Shared mutable context threaded through every FSM handler.
//!
//! `ControllerContext` owns the engine handle, the active configuration,
//! timing, the health monitor and the thrust regulator. State handlers
//! read and write it; nothing outside the controller holds a reference.

use crate::app::ports::EnginePort;
use crate::config::ControllerConfig;
use crate::control::pid::PidController;
use crate::engine::EngineParameters;
use crate::error::SensorError;
use crate::safety::HealthMonitor;

pub struct ControllerContext<E> {
    // -- Engine --
    pub engine: E,

    // -- Configuration --
    /// Mission configuration. Replaced wholesale by the controller.
    pub config: ControllerConfig,

    // -- Timing --
    /// Clock reading for the current cycle (ms).
    pub now_ms: u64,
    /// Seconds since the previous cycle.
    pub dt_secs: f32,
    /// Clock reading when the current state was entered (ms).
    pub state_entered_ms: u64,
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,

    // -- Monitoring --
    pub health: HealthMonitor,

    // -- Regulation --
    pub thrust_pid: PidController,
}

impl<E: EnginePort> ControllerContext<E> {
    pub fn new(engine: E, config: ControllerConfig) -> Self {
        Self {
            engine,
            thrust_pid: PidController::for_thrust(config.target_thrust),
            config,
            now_ms: 0,
            dt_secs: 0.0,
            state_entered_ms: 0,
            ticks_in_state: 0,
            health: HealthMonitor::new(),
        }
    }

    /// Milliseconds spent in the current state.
    pub fn ms_in_state(&self) -> u64 {
        self.now_ms.saturating_sub(self.state_entered_ms)
    }

    /// Pull fresh engine parameters for this cycle's telemetry record.
    pub fn refresh_telemetry(&mut self) -> Result<EngineParameters, SensorError> {
        self.engine.parameters()
    }

    /// Composite health predicate: engine hard-ceiling safety AND
    /// chamber temperature ≤ configured max AND chamber pressure ≤
    /// configured max. Each evaluation uses fresh readings.
    pub fn check_system_health(&mut self) -> bool {
        self.evaluate_health().0
    }

    /// [`check_system_health`](Self::check_system_health) that also hands
    /// back the parameters it read, for callers that act on them.
    pub fn evaluate_health(&mut self) -> (bool, Result<EngineParameters, SensorError>) {
        let engine_faults = self.engine.safety_faults();
        let params = self.engine.parameters();
        let faults = self
            .health
            .evaluate(engine_faults, params.as_ref().map_err(|e| *e), &self.config);
        (faults == 0, params)
    }

    /// Fault bitmask from the most recent health evaluation.
    pub fn fault_flags(&self) -> u8 {
        self.health.faults()
    }
}
