//! Controller service: the hexagonal core.
//!
//! [`Controller`] owns the state machine, its context (engine handle,
//! configuration, health monitor, thrust regulator) and the clock. It
//! exposes a hardware-agnostic API: the driver loop calls [`init`] once
//! and [`run`] repeatedly; the operator layer calls the command methods
//! between cycles.
//!
//! ```text
//!  ClockPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                │        Controller         │
//!  EnginePort ◀─▶│  FSM · Health · Guards   │
//!                └──────────────────────────┘
//! ```
//!
//! [`init`]: Controller::init
//! [`run`]: Controller::run

use log::{info, warn};

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::fsm::context::ControllerContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{ControllerState, Fsm, GuardedCommand};

use super::commands::OperatorCommand;
use super::events::{ControllerEvent, TelemetryData};
use super::ports::{ClockPort, EnginePort, EventSink};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<E, C> {
    fsm: Fsm<E>,
    ctx: ControllerContext<E>,
    clock: C,
    /// Clock reading of the previous `run()`, for the regulator step.
    last_run_ms: Option<u64>,
}

impl<E: EnginePort, C: ClockPort> Controller<E, C> {
    /// Construct in `Init` with the default configuration.
    ///
    /// Does **not** touch the engine. Call [`init`](Self::init) next.
    pub fn new(engine: E, clock: C) -> Self {
        let config = ControllerConfig::default();
        Self {
            fsm: Fsm::new(build_state_table(), ControllerState::Init),
            ctx: ControllerContext::new(engine, config),
            clock,
            last_run_ms: None,
        }
    }

    /// Construct with a validated configuration.
    pub fn with_config(engine: E, clock: C, config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        let mut controller = Self::new(engine, clock);
        controller.ctx.config = config;
        controller.ctx.thrust_pid.set_target(config.target_thrust);
        Ok(controller)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the engine model up and move `Init` → `Idle`.
    ///
    /// Only meaningful once; later calls are ignored so a running engine
    /// is never re-initialized under the state machine.
    pub fn init(&mut self, sink: &mut impl EventSink) {
        if self.state() != ControllerState::Init {
            warn!("init() ignored in {:?}", self.state());
            return;
        }

        self.sync_clock();
        self.ctx.engine.init();
        self.fsm.start(&mut self.ctx);
        self.fsm.transition_to(ControllerState::Idle, &mut self.ctx);

        sink.emit(&ControllerEvent::StateChanged {
            from: ControllerState::Init,
            to: ControllerState::Idle,
        });
        sink.emit(&ControllerEvent::Started(self.state()));
        info!("Controller started in {:?}", self.state());
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// One control cycle: refresh telemetry, then exactly one state's logic.
    pub fn run(&mut self, sink: &mut impl EventSink) {
        let now = self.clock.now_ms();
        self.ctx.dt_secs = self
            .last_run_ms
            .map_or(0.0, |last| now.saturating_sub(last) as f32 / 1000.0);
        self.ctx.now_ms = now;
        self.last_run_ms = Some(now);

        let prev = self.fsm.current_state();

        // 1. Telemetry
        self.refresh_telemetry(sink);

        // 2. State logic
        self.fsm.tick(&mut self.ctx);

        // 3. Report what the state logic decided
        let next = self.fsm.current_state();
        if next != prev {
            if next == ControllerState::Error {
                sink.emit(&ControllerEvent::HealthCheckFailed(self.ctx.fault_flags()));
            }
            sink.emit(&ControllerEvent::StateChanged { from: prev, to: next });
        }
    }

    // ── Operator commands ─────────────────────────────────────

    /// Idle → PreflightCheck.
    pub fn arm(&mut self, sink: &mut impl EventSink) -> bool {
        self.apply_guarded(GuardedCommand::Arm, sink)
    }

    /// Armed → Idle.
    pub fn disarm(&mut self, sink: &mut impl EventSink) -> bool {
        self.apply_guarded(GuardedCommand::Disarm, sink)
    }

    /// Armed → Ignition. Starts the engine model before the transition.
    pub fn start_engine(&mut self, sink: &mut impl EventSink) -> bool {
        self.apply_guarded(GuardedCommand::StartEngine, sink)
    }

    /// Running → Shutdown.
    pub fn stop_engine(&mut self, sink: &mut impl EventSink) -> bool {
        self.apply_guarded(GuardedCommand::StopEngine, sink)
    }

    /// Stop the engine and force `Error` from any state. Always succeeds.
    pub fn emergency_shutdown(&mut self, sink: &mut impl EventSink) {
        self.sync_clock();
        let from = self.state();
        warn!("EMERGENCY SHUTDOWN requested in {:?}", from);

        self.ctx.engine.stop();
        self.fsm.transition_to(ControllerState::Error, &mut self.ctx);

        sink.emit(&ControllerEvent::EmergencyShutdown { from });
        if from != ControllerState::Error {
            sink.emit(&ControllerEvent::StateChanged {
                from,
                to: ControllerState::Error,
            });
        }
    }

    /// Dispatch an operator command. Returns whether it was accepted.
    pub fn handle_command(&mut self, cmd: OperatorCommand, sink: &mut impl EventSink) -> bool {
        match cmd {
            OperatorCommand::Arm => self.arm(sink),
            OperatorCommand::Disarm => self.disarm(sink),
            OperatorCommand::StartEngine => self.start_engine(sink),
            OperatorCommand::StopEngine => self.stop_engine(sink),
            OperatorCommand::EmergencyShutdown => {
                self.emergency_shutdown(sink);
                true
            }
            OperatorCommand::SetConfig(config) => match self.set_config(config) {
                Ok(()) => true,
                Err(e) => {
                    warn!("SetConfig rejected: {}", e);
                    false
                }
            },
        }
    }

    // ── Health & configuration ────────────────────────────────

    /// Engine hard-ceiling safety AND chamber temperature and pressure
    /// within the configured limits (inclusive). Reads fresh sensors.
    pub fn check_system_health(&mut self) -> bool {
        self.ctx.check_system_health()
    }

    /// Replace the configuration wholesale. An invalid configuration is
    /// rejected and the current one stays in place.
    pub fn set_config(&mut self, config: ControllerConfig) -> Result<()> {
        config.validate()?;
        self.ctx.config = config;
        self.ctx.thrust_pid.set_target(config.target_thrust);
        info!(
            "Configuration updated: {:.0} N, {:.1} °C, {:.1} bar, {} ms",
            config.target_thrust,
            config.max_temperature,
            config.max_pressure,
            config.run_duration_ms
        );
        Ok(())
    }

    pub fn config(&self) -> ControllerConfig {
        self.ctx.config
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        self.fsm.current_state()
    }

    pub fn engine(&self) -> &E {
        &self.ctx.engine
    }

    /// Fault bitmask from the most recent health evaluation (0 = healthy).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags()
    }

    /// Clock reading when the current state was entered (ms).
    pub fn state_entered_ms(&self) -> u64 {
        self.ctx.state_entered_ms
    }

    pub fn ticks_in_state(&self) -> u64 {
        self.fsm.ticks_in_current_state()
    }

    // ── Internal ──────────────────────────────────────────────

    fn sync_clock(&mut self) {
        self.ctx.now_ms = self.clock.now_ms();
    }

    fn apply_guarded(&mut self, command: GuardedCommand, sink: &mut impl EventSink) -> bool {
        let from = self.state();
        let Some(to) = from.on_command(command) else {
            warn!("{:?} rejected in {:?}", command, from);
            sink.emit(&ControllerEvent::CommandRejected {
                command,
                state: from,
            });
            return false;
        };

        self.sync_clock();
        if command == GuardedCommand::StartEngine {
            self.ctx.engine.start();
        }
        self.fsm.transition_to(to, &mut self.ctx);
        sink.emit(&ControllerEvent::StateChanged { from, to });
        true
    }

    fn refresh_telemetry(&mut self, sink: &mut impl EventSink) {
        match self.ctx.refresh_telemetry() {
            Ok(parameters) => sink.emit(&ControllerEvent::Telemetry(TelemetryData {
                state: self.state(),
                parameters,
                throttle: self.ctx.engine.throttle(),
                fault_flags: self.ctx.fault_flags(),
                timestamp_ms: self.ctx.now_ms,
            })),
            Err(e) => {
                warn!("Telemetry refresh failed: {}", e);
                sink.emit(&ControllerEvent::SensorUnavailable(e));
            }
        }
    }
}
