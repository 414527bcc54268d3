//! Hotfire host simulator.
//!
//! Runs the controller against a simulated test stand, in real time, with a
//! scripted operator: arm, start once armed, then either stop on request or
//! let the burn timer end the run.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedTestStand    LogEventSink    MonotonicClock/StdDelay │
//! │  (AdcPort+Actuation)   (EventSink)     (ClockPort+DelayNs)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   Controller (FSM · Health · Guards · Thrust PID)      │    │
//! │  │   EngineInterface (valves · igniter · hard ceilings)   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Operator script ──▶ CommandQueue ──▶ control loop             │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use hotfire::adapters::log_sink::LogEventSink;
use hotfire::adapters::sim::SimulatedTestStand;
use hotfire::adapters::time::{MonotonicClock, StdDelay};
use hotfire::app::commands::OperatorCommand;
use hotfire::app::ports::ClockPort;
use hotfire::app::service::Controller;
use hotfire::command_queue::CommandQueue;
use hotfire::config::ControllerConfig;
use hotfire::engine::EngineInterface;
use hotfire::fsm::ControllerState;
use hotfire::sensors::AdcSensorSource;

#[derive(Parser, Debug)]
#[command(name = "hotfire-sim", about = "Run the engine controller against a simulated test stand")]
struct Args {
    /// JSON controller configuration; missing fields take their defaults.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Control cycle period (ms).
    #[arg(long, default_value_t = 10)]
    cycle_ms: u64,

    /// Give up after this much wall-clock time (ms).
    #[arg(long, default_value_t = 15_000)]
    timeout_ms: u64,

    /// Send StopEngine this long after the engine starts running (ms).
    #[arg(long)]
    stop_after_ms: Option<u64>,

    /// Fail every sensor conversion from this time on (ms).
    #[arg(long)]
    sensor_fault_at_ms: Option<u64>,

    /// Log one telemetry line every N cycles.
    #[arg(long, default_value_t = 50)]
    telemetry_every: u32,
}

fn load_config(path: Option<&PathBuf>) -> Result<ControllerConfig> {
    let Some(path) = path else {
        return Ok(ControllerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: ControllerConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config(args.config.as_ref())?;
    info!("Config: {:?}", config);

    // ── 3. Adapters ───────────────────────────────────────────
    let clock = MonotonicClock::new();
    let stand = SimulatedTestStand::new();
    let sensors = AdcSensorSource::new(stand.adc(), clock);
    let engine = EngineInterface::new(sensors, stand.actuators(), StdDelay);
    let mut sink = LogEventSink::with_telemetry_decimation(args.telemetry_every);

    // ── 4. Controller ─────────────────────────────────────────
    let mut controller = Controller::with_config(engine, clock, config)?;
    controller.init(&mut sink);

    let mut queue = CommandQueue::new();
    let (mut operator, mut commands) = queue.split();

    // ── 5. Control loop ───────────────────────────────────────
    let cycle = Duration::from_millis(args.cycle_ms);
    let mut last_ms = clock.now_ms();
    let mut armed_sent = false;
    let mut start_sent = false;
    let mut stop_sent = false;
    let mut running_since: Option<u64> = None;

    loop {
        let now = clock.now_ms();
        if now >= args.timeout_ms {
            warn!("Simulation timed out in {:?}", controller.state());
            break;
        }

        // Operator script
        match controller.state() {
            ControllerState::Idle if !armed_sent => {
                armed_sent = operator.send(OperatorCommand::Arm);
            }
            ControllerState::Armed if !start_sent => {
                start_sent = operator.send(OperatorCommand::StartEngine);
            }
            ControllerState::Running => {
                let since = *running_since.get_or_insert(now);
                if let Some(after) = args.stop_after_ms {
                    if !stop_sent && now.saturating_sub(since) >= after {
                        stop_sent = operator.send(OperatorCommand::StopEngine);
                    }
                }
            }
            _ => {}
        }

        if let Some(at) = args.sensor_fault_at_ms {
            if now >= at {
                stand.set_sensor_fault(true);
            }
        }

        commands.dispatch(&mut controller, &mut sink);
        controller.run(&mut sink);

        stand.step(now.saturating_sub(last_ms) as f32 / 1000.0);
        last_ms = now;

        match controller.state() {
            ControllerState::Error => {
                bail!(
                    "controller latched Error, faults=0b{:08b}",
                    controller.fault_flags()
                );
            }
            ControllerState::Idle if start_sent => {
                info!("Run complete, engine safed");
                break;
            }
            _ => {}
        }

        std::thread::sleep(cycle);
    }

    Ok(())
}
