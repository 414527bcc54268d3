//! Hotfire engine control unit core.
//!
//! Exposes the control logic for integration testing and for the host
//! simulation driver. Peripheral access is kept behind the port traits in
//! [`app::ports`]; nothing in this crate touches registers directly.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod command_queue;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod sensors;
