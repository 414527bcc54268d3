//! Operator command queue.
//!
//! Commands are produced by the operator context (UART receive handler,
//! radio task, console script) and consumed by the control loop, which
//! drains the queue between `run()` cycles. A command therefore takes
//! effect at a cycle boundary, never in the middle of one.
//!
//! `EmergencyShutdown` bypasses the ring: it sets a latch that the
//! receiver checks before every dequeue, so an abort is never dropped by a
//! full queue and is applied ahead of anything already pending.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ UART / radio │────▶│  CommandQueue    │────▶│  Control loop    │
//! │ (producer)   │     │  (lock-free SPSC)│     │  (consumer)      │
//! └──────────────┘     └──────────────────┘     └──────────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};
use log::{error, warn};

use crate::app::commands::OperatorCommand;
use crate::app::ports::{ClockPort, EnginePort, EventSink};
use crate::app::service::Controller;

/// Backing array size. Power of 2; one slot stays free, so at most
/// `COMMAND_QUEUE_CAP - 1` commands can be pending.
pub const COMMAND_QUEUE_CAP: usize = 16;

/// Fixed-capacity storage for pending commands. Split once into a
/// [`CommandSender`] and a [`CommandReceiver`].
pub struct CommandQueue {
    inner: Queue<OperatorCommand, COMMAND_QUEUE_CAP>,
    estop: AtomicBool,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub const fn new() -> Self {
        Self {
            inner: Queue::new(),
            estop: AtomicBool::new(false),
        }
    }

    /// Hand out the producer and consumer halves.
    pub fn split(&mut self) -> (CommandSender<'_>, CommandReceiver<'_>) {
        let (tx, rx) = self.inner.split();
        let estop = &self.estop;
        (
            CommandSender { inner: tx, estop },
            CommandReceiver { inner: rx, estop },
        )
    }
}

/// Producer half, owned by the operator context.
pub struct CommandSender<'q> {
    inner: Producer<'q, OperatorCommand, COMMAND_QUEUE_CAP>,
    estop: &'q AtomicBool,
}

impl CommandSender<'_> {
    /// Queue a command. Returns `false` if the queue is full (dropped).
    /// `EmergencyShutdown` always succeeds.
    pub fn send(&mut self, cmd: OperatorCommand) -> bool {
        if cmd == OperatorCommand::EmergencyShutdown {
            self.estop.store(true, Ordering::Release);
            error!("Emergency shutdown latched");
            return true;
        }
        match self.inner.enqueue(cmd) {
            Ok(()) => true,
            Err(dropped) => {
                warn!("Command queue full, dropped {:?}", dropped);
                false
            }
        }
    }
}

/// Consumer half, owned by the control loop.
pub struct CommandReceiver<'q> {
    inner: Consumer<'q, OperatorCommand, COMMAND_QUEUE_CAP>,
    estop: &'q AtomicBool,
}

impl CommandReceiver<'_> {
    /// Next command: a latched emergency shutdown first, then FIFO order.
    pub fn recv(&mut self) -> Option<OperatorCommand> {
        if self.estop.swap(false, Ordering::AcqRel) {
            return Some(OperatorCommand::EmergencyShutdown);
        }
        self.inner.dequeue()
    }

    pub fn len(&self) -> usize {
        self.inner.len() + usize::from(self.estop.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every pending command to `controller`, in FIFO order.
    /// Returns how many were accepted.
    pub fn dispatch<E: EnginePort, C: ClockPort>(
        &mut self,
        controller: &mut Controller<E, C>,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut accepted = 0;
        while let Some(cmd) = self.recv() {
            if controller.handle_command(cmd, sink) {
                accepted += 1;
            }
        }
        accepted
    }
}
