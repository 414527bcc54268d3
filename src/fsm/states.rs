//! Concrete state handler functions and table builder.
//!
//! ```text
//!  INIT ──▶ IDLE ──[arm]──▶ PREFLIGHT ──[healthy]──▶ ARMED ──[start]──▶ IGNITION
//!            ▲  ▲                │                    │                     │
//!            │  └────[disarm]────┼────────────────────┘                     ▼
//!            │                   │                                       RUNNING
//!            │              [unhealthy]                                  │     │
//!            │                   ▼                          [stop/timeout]  [unhealthy]
//!            └──── SHUTDOWN ◀────┼───────────────────────────────┘         │
//!                                ▼                                          ▼
//!                              ERROR ◀──────────────────────────────────────┘
//!
//!  Any state ──[emergency shutdown]──▶ ERROR (no automatic exit)
//! ```

use log::{error, info, warn};

use super::context::ControllerContext;
use super::{ControllerState, StateDescriptor};
use crate::app::ports::EnginePort;
use crate::engine::EngineStatus;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table. Called once when the controller is constructed.
pub fn build_state_table<E: EnginePort>() -> [StateDescriptor<E>; ControllerState::COUNT] {
    [
        StateDescriptor {
            id: ControllerState::Init,
            name: "Init",
            on_enter: None,
            on_exit: None,
            on_update: init_update::<E>,
        },
        StateDescriptor {
            id: ControllerState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter::<E>),
            on_exit: None,
            on_update: wait_for_command::<E>,
        },
        StateDescriptor {
            id: ControllerState::PreflightCheck,
            name: "PreflightCheck",
            on_enter: Some(preflight_enter::<E>),
            on_exit: None,
            on_update: preflight_update::<E>,
        },
        StateDescriptor {
            id: ControllerState::Armed,
            name: "Armed",
            on_enter: Some(armed_enter::<E>),
            on_exit: None,
            on_update: wait_for_command::<E>,
        },
        StateDescriptor {
            id: ControllerState::Ignition,
            name: "Ignition",
            on_enter: Some(ignition_enter::<E>),
            on_exit: None,
            on_update: ignition_update::<E>,
        },
        StateDescriptor {
            id: ControllerState::Running,
            name: "Running",
            on_enter: Some(running_enter::<E>),
            on_exit: Some(running_exit::<E>),
            on_update: running_update::<E>,
        },
        StateDescriptor {
            id: ControllerState::Shutdown,
            name: "Shutdown",
            on_enter: Some(shutdown_enter::<E>),
            on_exit: None,
            on_update: shutdown_update::<E>,
        },
        StateDescriptor {
            id: ControllerState::Error,
            name: "Error",
            on_enter: Some(error_enter::<E>),
            on_exit: None,
            on_update: error_update::<E>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT / IDLE / ARMED
// ═══════════════════════════════════════════════════════════════════════════

fn init_update<E: EnginePort>(_ctx: &mut ControllerContext<E>) -> Option<ControllerState> {
    Some(ControllerState::Idle)
}

fn idle_enter<E: EnginePort>(_ctx: &mut ControllerContext<E>) {
    info!("IDLE: safe, awaiting arm command");
}

fn armed_enter<E: EnginePort>(ctx: &mut ControllerContext<E>) {
    info!(
        "ARMED: target {:.0} N, limits {:.1} °C / {:.1} bar",
        ctx.config.target_thrust, ctx.config.max_temperature, ctx.config.max_pressure
    );
}

/// Idle and Armed only move on operator commands.
fn wait_for_command<E: EnginePort>(_ctx: &mut ControllerContext<E>) -> Option<ControllerState> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PREFLIGHT CHECK
// ═══════════════════════════════════════════════════════════════════════════

fn preflight_enter<E: EnginePort>(_ctx: &mut ControllerContext<E>) {
    info!("PREFLIGHT: health check on next cycle");
}

fn preflight_update<E: EnginePort>(ctx: &mut ControllerContext<E>) -> Option<ControllerState> {
    if ctx.check_system_health() {
        info!("PREFLIGHT: passed");
        Some(ControllerState::Armed)
    } else {
        warn!("PREFLIGHT: failed, faults=0b{:08b}", ctx.fault_flags());
        Some(ControllerState::Error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IGNITION
// ═══════════════════════════════════════════════════════════════════════════

fn ignition_enter<E: EnginePort>(ctx: &mut ControllerContext<E>) {
    info!("IGNITION: engine status {:?}", ctx.engine.status());
}

fn ignition_update<E: EnginePort>(ctx: &mut ControllerContext<E>) -> Option<ControllerState> {
    ctx.engine.trigger_ignition();
    Some(ControllerState::Running)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter<E: EnginePort>(ctx: &mut ControllerContext<E>) {
    ctx.thrust_pid.reset();
    ctx.thrust_pid.set_target(ctx.config.target_thrust);
    info!(
        "RUNNING: regulating to {:.0} N, burn {} ms",
        ctx.config.target_thrust, ctx.config.run_duration_ms
    );
    let status = ctx.engine.status();
    if status != EngineStatus::Running {
        warn!("RUNNING: entered with engine {:?}, start was refused", status);
    }
}

fn running_exit<E: EnginePort>(ctx: &mut ControllerContext<E>) {
    ctx.thrust_pid.reset();
}

fn running_update<E: EnginePort>(ctx: &mut ControllerContext<E>) -> Option<ControllerState> {
    let (healthy, params) = ctx.evaluate_health();
    if !healthy {
        error!(
            "RUNNING: health check failed, faults=0b{:08b}, emergency shutdown",
            ctx.fault_flags()
        );
        return Some(ControllerState::Error);
    }

    let burn_ms = u64::from(ctx.config.run_duration_ms);
    if burn_ms > 0 && ctx.ms_in_state() >= burn_ms {
        info!("RUNNING: burn duration {} ms reached", burn_ms);
        return Some(ControllerState::Shutdown);
    }

    // Healthy implies the parameters were read successfully.
    if let Ok(p) = params {
        let throttle = ctx.thrust_pid.compute(p.thrust, ctx.dt_secs);
        ctx.engine.set_throttle(throttle);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SHUTDOWN
// ═══════════════════════════════════════════════════════════════════════════

fn shutdown_enter<E: EnginePort>(_ctx: &mut ControllerContext<E>) {
    info!("SHUTDOWN: closing valves on next cycle");
}

fn shutdown_update<E: EnginePort>(ctx: &mut ControllerContext<E>) -> Option<ControllerState> {
    ctx.engine.stop();
    Some(ControllerState::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR: engine held stopped until an external reset
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter<E: EnginePort>(ctx: &mut ControllerContext<E>) {
    ctx.engine.stop();
    error!(
        "ERROR: engine stopped, faults=0b{:08b}, awaiting external reset",
        ctx.fault_flags()
    );
}

fn error_update<E: EnginePort>(ctx: &mut ControllerContext<E>) -> Option<ControllerState> {
    ctx.engine.stop();
    None
}
