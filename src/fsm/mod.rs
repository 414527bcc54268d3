//! Function-pointer finite state machine engine for the controller.
//!
//! ```text
//! ┌────────────────┬───────────┬──────────┬───────────────────┐
//! │ ControllerState│ on_enter  │ on_exit  │ on_update         │
//! ├────────────────┼───────────┼──────────┼───────────────────┤
//! │ Init           │ -         │ -        │ fn(ctx)->Option<> │
//! │ Idle           │ fn(ctx)   │ -        │ fn(ctx)->Option<> │
//! │ PreflightCheck │ fn(ctx)   │ -        │ fn(ctx)->Option<> │
//! │ Armed          │ fn(ctx)   │ -        │ fn(ctx)->Option<> │
//! │ Ignition       │ fn(ctx)   │ -        │ fn(ctx)->Option<> │
//! │ Running        │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │
//! │ Shutdown       │ fn(ctx)   │ -        │ fn(ctx)->Option<> │
//! │ Error          │ fn(ctx)   │ -        │ fn(ctx)->Option<> │
//! └────────────────┴───────────┴──────────┴───────────────────┘
//! ```
//!
//! Each `tick` calls `on_update` for the **current** state only. If it
//! returns `Some(next)`, the engine runs `on_exit` for the current state,
//! then `on_enter` for the next. Operator commands do not go through
//! `on_update`: they are checked against the guard table
//! ([`ControllerState::on_command`]) and applied with [`Fsm::transition_to`].

pub mod context;
pub mod states;

use log::info;
use serde::{Deserialize, Serialize};

use crate::app::ports::EnginePort;
use context::ControllerContext;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Mission phase. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerState {
    Init = 0,
    Idle = 1,
    PreflightCheck = 2,
    Armed = 3,
    Ignition = 4,
    Running = 5,
    Shutdown = 6,
    Error = 7,
}

impl ControllerState {
    /// Total number of states; sizes the table array.
    pub const COUNT: usize = 8;

    pub const ALL: [ControllerState; Self::COUNT] = [
        Self::Init,
        Self::Idle,
        Self::PreflightCheck,
        Self::Armed,
        Self::Ignition,
        Self::Running,
        Self::Shutdown,
        Self::Error,
    ];

    /// Convert a table index back to a state. Out-of-range maps to `Error`.
    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_else(|| {
            debug_assert!(false, "invalid state index: {idx}");
            Self::Error
        })
    }

    /// Guard table for guarded operator commands.
    ///
    /// Returns the target state when `command` is accepted in `self`, or
    /// `None` when it must be rejected with no side effects.
    pub const fn on_command(self, command: GuardedCommand) -> Option<ControllerState> {
        match (self, command) {
            (Self::Idle, GuardedCommand::Arm) => Some(Self::PreflightCheck),
            (Self::Armed, GuardedCommand::Disarm) => Some(Self::Idle),
            (Self::Armed, GuardedCommand::StartEngine) => Some(Self::Ignition),
            (Self::Running, GuardedCommand::StopEngine) => Some(Self::Shutdown),
            _ => None,
        }
    }
}

/// Operator commands whose acceptance depends on the current state.
/// (Emergency shutdown is accepted everywhere and is not listed.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardedCommand {
    Arm,
    Disarm,
    StartEngine,
    StopEngine,
}

impl GuardedCommand {
    pub const ALL: [GuardedCommand; 4] = [
        Self::Arm,
        Self::Disarm,
        Self::StartEngine,
        Self::StopEngine,
    ];
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action. Runs exactly once per transition.
pub type StateActionFn<E> = fn(&mut ControllerContext<E>);

/// Per-cycle handler. `Some(next)` requests a transition.
pub type StateUpdateFn<E> = fn(&mut ControllerContext<E>) -> Option<ControllerState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor<E> {
    pub id: ControllerState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<E>>,
    pub on_exit: Option<StateActionFn<E>>,
    pub on_update: StateUpdateFn<E>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// Owns the state table and the current-state pointer. The mutable
/// [`ControllerContext`] is threaded through every handler call.
pub struct Fsm<E> {
    /// Fixed-size table indexed by `ControllerState as usize`.
    table: [StateDescriptor<E>; ControllerState::COUNT],
    current: usize,
    /// Monotonic tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl<E: EnginePort> Fsm<E> {
    pub fn new(
        table: [StateDescriptor<E>; ControllerState::COUNT],
        initial: ControllerState,
    ) -> Self {
        debug_assert!(
            table
                .iter()
                .enumerate()
                .all(|(i, row)| row.id as usize == i),
            "state table rows must be ordered by state index"
        );
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`. Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ControllerContext<E>) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        ctx.state_entered_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Execute one state's logic and at most one resulting transition.
    pub fn tick(&mut self, ctx: &mut ControllerContext<E>) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;

        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    /// Transition immediately, outside of `tick` (operator commands and
    /// emergency shutdown). No-op if already in `next`.
    pub fn transition_to(&mut self, next: ControllerState, ctx: &mut ControllerContext<E>) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> ControllerState {
        ControllerState::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: ControllerState, ctx: &mut ControllerContext<E>) {
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;
        ctx.state_entered_ms = ctx.now_ms;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
