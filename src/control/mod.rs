//! Closed-loop regulation used while the engine is running.

pub mod pid;
