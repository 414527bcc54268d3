//! Inbound operator commands.
//!
//! Produced by the operator layer (console, radio link, test script) and
//! handed to [`Controller::handle_command`](super::service::Controller::handle_command),
//! usually through the [`CommandQueue`](crate::command_queue::CommandQueue).

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::fsm::GuardedCommand;

/// Commands that the operator layer can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OperatorCommand {
    /// Idle → PreflightCheck.
    Arm,
    /// Armed → Idle.
    Disarm,
    /// Armed → Ignition, starting the engine model.
    StartEngine,
    /// Running → Shutdown.
    StopEngine,
    /// Any state → Error, engine stopped. Never rejected.
    EmergencyShutdown,
    /// Replace the mission configuration wholesale.
    SetConfig(ControllerConfig),
}

impl From<GuardedCommand> for OperatorCommand {
    fn from(cmd: GuardedCommand) -> Self {
        match cmd {
            GuardedCommand::Arm => Self::Arm,
            GuardedCommand::Disarm => Self::Disarm,
            GuardedCommand::StartEngine => Self::StartEngine,
            GuardedCommand::StopEngine => Self::StopEngine,
        }
    }
}
