//! Application core: pure control logic, zero I/O.
//!
//! Holds the controller orchestration (state machine, health evaluation,
//! operator command guards). All interaction with hardware happens through
//! the **port traits** in [`ports`], so this layer runs unchanged against
//! the real engine model, a simulated stand, or a scripted test double.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
