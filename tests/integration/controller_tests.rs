//! Controller → engine model → actuators, end to end on mock hardware.

use embedded_hal::digital::PinState;

use hotfire::app::commands::OperatorCommand;
use hotfire::app::events::ControllerEvent;
use hotfire::app::service::Controller;
use hotfire::command_queue::{COMMAND_QUEUE_CAP, CommandQueue};
use hotfire::config::ControllerConfig;
use hotfire::engine::EngineStatus;
use hotfire::error::{SafetyFault, SensorError};
use hotfire::fsm::{ControllerState, GuardedCommand};
use hotfire::pins::{FUEL_MAIN_VALVE, IGNITER_PIN, IGNITER_PORT, OXIDIZER_MAIN_VALVE, VALVE_PORT};

use crate::mock_hw::{ActuationCall, MockClock, MockEngine, MockStand, RecordingSink};

type TestController = Controller<MockEngine, MockClock>;

fn make_controller() -> (TestController, MockStand, RecordingSink) {
    let stand = MockStand::new();
    let mut ctl = stand.controller();
    let mut sink = RecordingSink::new();
    ctl.init(&mut sink);
    (ctl, stand, sink)
}

/// Drive a fresh controller into `Running`.
fn running() -> (TestController, MockStand, RecordingSink) {
    let (mut ctl, stand, mut sink) = make_controller();
    assert!(ctl.arm(&mut sink));
    ctl.run(&mut sink);
    assert!(ctl.start_engine(&mut sink));
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Running);
    (ctl, stand, sink)
}

fn valves_closed(stand: &MockStand) -> bool {
    stand.pin_level(VALVE_PORT, FUEL_MAIN_VALVE) == Some(PinState::Low)
        && stand.pin_level(VALVE_PORT, OXIDIZER_MAIN_VALVE) == Some(PinState::Low)
}

fn igniter_pulses(stand: &MockStand) -> usize {
    stand
        .calls()
        .iter()
        .filter(|c| {
            **c == ActuationCall::Pin {
                port: IGNITER_PORT,
                pin: IGNITER_PIN,
                state: PinState::High,
            }
        })
        .count()
}

// ── Scenario 1: nominal arm → start → running ────────────────

#[test]
fn nominal_sequence_reaches_running() {
    let (mut ctl, stand, mut sink) = make_controller();
    assert_eq!(ctl.state(), ControllerState::Idle);

    assert!(ctl.arm(&mut sink));
    assert_eq!(ctl.state(), ControllerState::PreflightCheck);

    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Armed);

    assert!(ctl.start_engine(&mut sink));
    assert_eq!(ctl.state(), ControllerState::Ignition);
    assert_eq!(ctl.engine().status(), EngineStatus::Running);
    assert_eq!(stand.pin_level(VALVE_PORT, FUEL_MAIN_VALVE), Some(PinState::High));
    assert_eq!(
        stand.pin_level(VALVE_PORT, OXIDIZER_MAIN_VALVE),
        Some(PinState::High)
    );

    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Running);
    // Once from the engine start, once from the Ignition state.
    assert_eq!(igniter_pulses(&stand), 2);
    assert_eq!(
        stand.pin_level(IGNITER_PORT, IGNITER_PIN),
        Some(PinState::Low)
    );
}

// ── Scenario 2: over-temperature while running ───────────────

#[test]
fn over_temperature_while_running_shuts_down() {
    let (mut ctl, stand, mut sink) = running();
    let max = ctl.config().max_temperature;
    stand.set_readings(max + 1.0, 10.0);

    ctl.run(&mut sink);

    assert_eq!(ctl.state(), ControllerState::Error);
    assert_eq!(ctl.engine().status(), EngineStatus::Shutdown);
    assert!(valves_closed(&stand));
    assert!(SafetyFault::OverTemperature.is_set(ctl.fault_flags()));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        ControllerEvent::HealthCheckFailed(f) if SafetyFault::OverTemperature.is_set(*f)
    )));
}

#[test]
fn over_pressure_while_running_shuts_down() {
    let (mut ctl, stand, mut sink) = running();
    stand.set_readings(100.0, ctl.config().max_pressure + 0.5);

    ctl.run(&mut sink);

    assert_eq!(ctl.state(), ControllerState::Error);
    assert!(valves_closed(&stand));
    assert!(SafetyFault::OverPressure.is_set(ctl.fault_flags()));
}

#[test]
fn sensor_loss_while_running_shuts_down() {
    let (mut ctl, stand, mut sink) = running();
    stand.fail_sensors(Some(SensorError::AdcReadFailed));

    ctl.run(&mut sink);

    assert_eq!(ctl.state(), ControllerState::Error);
    assert!(valves_closed(&stand));
    assert!(SafetyFault::SensorUnavailable.is_set(ctl.fault_flags()));
    assert!(
        sink.events
            .contains(&ControllerEvent::SensorUnavailable(SensorError::AdcReadFailed))
    );
}

// ── Scenario 3: guarded commands ─────────────────────────────

#[test]
fn arm_while_running_is_rejected() {
    let (mut ctl, stand, mut sink) = running();
    stand.clear_calls();
    let config = ctl.config();

    assert!(!ctl.arm(&mut sink));
    assert_eq!(ctl.state(), ControllerState::Running);
    assert_eq!(ctl.config(), config);
    assert!(stand.calls().is_empty());
    assert!(sink.events.contains(&ControllerEvent::CommandRejected {
        command: GuardedCommand::Arm,
        state: ControllerState::Running,
    }));
}

#[test]
fn start_outside_armed_never_touches_the_engine() {
    let (mut ctl, stand, mut sink) = make_controller();
    assert!(!ctl.start_engine(&mut sink));
    assert_eq!(ctl.engine().status(), EngineStatus::Idle);
    assert!(stand.calls().is_empty());
}

// ── Scenario 4: operator stop ────────────────────────────────

#[test]
fn ignition_state_fires_after_refused_start() {
    let (mut ctl, stand, mut sink) = make_controller();
    assert!(ctl.arm(&mut sink));
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Armed);

    stand.set_readings(250.0, 1.0);
    assert!(ctl.start_engine(&mut sink));
    assert_eq!(ctl.engine().status(), EngineStatus::Fault);
    assert_eq!(igniter_pulses(&stand), 0);

    stand.clear_calls();
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Running);
    assert_eq!(igniter_pulses(&stand), 1);
}

#[test]
fn refused_start_stays_visible_in_telemetry() {
    let (mut ctl, stand, mut sink) = make_controller();
    assert!(ctl.arm(&mut sink));
    ctl.run(&mut sink);

    // One over-ceiling sample refuses the start, then readings recover.
    stand.set_readings(250.0, 1.0);
    assert!(ctl.start_engine(&mut sink));
    stand.set_readings(25.0, 1.0);
    ctl.run(&mut sink);
    sink.clear();
    ctl.run(&mut sink);

    assert_eq!(ctl.state(), ControllerState::Running);
    assert_ne!(
        stand.pin_level(VALVE_PORT, FUEL_MAIN_VALVE),
        Some(PinState::High)
    );
    let statuses: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::Telemetry(t) => Some((t.state, t.parameters.status)),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![(ControllerState::Running, EngineStatus::Fault)]
    );
}

#[test]
fn stop_engine_returns_to_idle_safed() {
    let (mut ctl, stand, mut sink) = running();
    stand.set_readings(60.0, 30.0);
    stand.advance_ms(10);
    ctl.run(&mut sink);
    assert!(ctl.engine().throttle() > 0.0);

    assert!(ctl.stop_engine(&mut sink));
    assert_eq!(ctl.state(), ControllerState::Shutdown);

    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Idle);
    assert_eq!(ctl.engine().status(), EngineStatus::Shutdown);
    assert_eq!(ctl.engine().throttle(), 0.0);
    assert!(valves_closed(&stand));
}

// ── Preflight ────────────────────────────────────────────────

#[test]
fn preflight_failure_latches_error() {
    let (mut ctl, stand, mut sink) = make_controller();
    stand.set_readings(190.0, 1.0);

    ctl.arm(&mut sink);
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Error);

    // No way out of Error through operator commands.
    stand.set_readings(25.0, 1.0);
    for cmd in GuardedCommand::ALL {
        assert!(!ctl.handle_command(cmd.into(), &mut sink));
    }
    for _ in 0..5 {
        ctl.run(&mut sink);
    }
    assert_eq!(ctl.state(), ControllerState::Error);
}

// ── Health predicate ─────────────────────────────────────────

#[test]
fn health_limits_are_inclusive() {
    let (mut ctl, stand, _) = make_controller();
    let cfg = ctl.config();

    stand.set_readings(cfg.max_temperature, cfg.max_pressure);
    assert!(ctl.check_system_health());

    stand.set_readings(cfg.max_temperature + 0.01, cfg.max_pressure);
    assert!(!ctl.check_system_health());

    stand.set_readings(cfg.max_temperature, cfg.max_pressure + 0.01);
    assert!(!ctl.check_system_health());
}

#[test]
fn hard_ceiling_applies_whatever_the_config() {
    let (mut ctl, stand, _) = make_controller();
    ctl.set_config(ControllerConfig {
        max_temperature: 1000.0,
        max_pressure: 1000.0,
        ..ControllerConfig::default()
    })
    .unwrap();

    stand.set_readings(250.0, 1.0);
    assert!(!ctl.check_system_health());
    assert!(SafetyFault::HardOverTemperature.is_set(ctl.fault_flags()));
    assert!(!SafetyFault::OverTemperature.is_set(ctl.fault_flags()));
}

// ── Emergency shutdown ───────────────────────────────────────

#[test]
fn emergency_shutdown_from_running() {
    let (mut ctl, stand, mut sink) = running();
    ctl.emergency_shutdown(&mut sink);

    assert_eq!(ctl.state(), ControllerState::Error);
    assert_eq!(ctl.engine().status(), EngineStatus::Shutdown);
    assert!(valves_closed(&stand));
    assert!(sink.events.contains(&ControllerEvent::EmergencyShutdown {
        from: ControllerState::Running
    }));

    // Valves are driven closed again on every cycle.
    stand.clear_calls();
    ctl.run(&mut sink);
    assert!(valves_closed(&stand));
}

// ── Burn timer ───────────────────────────────────────────────

#[test]
fn burn_timer_ends_the_run() {
    let (mut ctl, stand, mut sink) = make_controller();
    ctl.set_config(ControllerConfig {
        run_duration_ms: 500,
        ..ControllerConfig::default()
    })
    .unwrap();
    ctl.arm(&mut sink);
    ctl.run(&mut sink);
    ctl.start_engine(&mut sink);
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Running);

    for _ in 0..49 {
        stand.advance_ms(10);
        ctl.run(&mut sink);
    }
    assert_eq!(ctl.state(), ControllerState::Running);

    stand.advance_ms(10);
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Shutdown);
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Idle);
    assert!(valves_closed(&stand));
}

// ── Telemetry ────────────────────────────────────────────────

#[test]
fn every_run_emits_telemetry() {
    let (mut ctl, stand, mut sink) = make_controller();
    sink.clear();
    stand.set_readings(30.0, 12.0);
    stand.advance_ms(250);

    ctl.run(&mut sink);

    let telemetry: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::Telemetry(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(telemetry.len(), 1);
    assert_eq!(telemetry[0].state, ControllerState::Idle);
    assert_eq!(telemetry[0].parameters.thrust, 120.0);
    assert_eq!(telemetry[0].timestamp_ms, 250);
}

// ── Command queue ────────────────────────────────────────────

#[test]
fn queued_commands_apply_at_cycle_boundaries() {
    let (mut ctl, _stand, mut sink) = make_controller();
    let mut queue = CommandQueue::new();
    let (mut tx, mut rx) = queue.split();

    tx.send(OperatorCommand::Arm);
    // Still in PreflightCheck when this is drained, so it is rejected.
    tx.send(OperatorCommand::StartEngine);
    assert_eq!(rx.dispatch(&mut ctl, &mut sink), 1);
    assert_eq!(ctl.state(), ControllerState::PreflightCheck);

    ctl.run(&mut sink);
    tx.send(OperatorCommand::StartEngine);
    assert_eq!(rx.dispatch(&mut ctl, &mut sink), 1);
    assert_eq!(ctl.state(), ControllerState::Ignition);

    tx.send(OperatorCommand::EmergencyShutdown);
    assert_eq!(rx.dispatch(&mut ctl, &mut sink), 1);
    assert_eq!(ctl.state(), ControllerState::Error);
}

#[test]
fn queued_emergency_shutdown_survives_a_full_queue() {
    let (mut ctl, stand, mut sink) = running();
    let mut queue = CommandQueue::new();
    let (mut tx, mut rx) = queue.split();

    for _ in 0..COMMAND_QUEUE_CAP - 1 {
        assert!(tx.send(OperatorCommand::Disarm));
    }
    assert!(tx.send(OperatorCommand::EmergencyShutdown));

    // The abort is applied first; every Disarm behind it is then rejected.
    assert_eq!(rx.dispatch(&mut ctl, &mut sink), 1);
    ctl.run(&mut sink);
    assert_eq!(ctl.state(), ControllerState::Error);
    assert_eq!(ctl.engine().status(), EngineStatus::Shutdown);
    assert!(valves_closed(&stand));
}

#[test]
fn queued_invalid_config_is_rejected() {
    let (mut ctl, _stand, mut sink) = make_controller();
    let mut queue = CommandQueue::new();
    let (mut tx, mut rx) = queue.split();

    tx.send(OperatorCommand::SetConfig(ControllerConfig {
        max_temperature: -5.0,
        ..ControllerConfig::default()
    }));
    assert_eq!(rx.dispatch(&mut ctl, &mut sink), 0);
    assert_eq!(ctl.config(), ControllerConfig::default());
}
