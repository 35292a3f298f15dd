//! Command model: lifecycle, interruption policy, and the execution context.
//!
//! A command is a unit of robot behavior claiming zero or more resources for
//! its lifetime. The scheduler drives the lifecycle:
//!
//! ```text
//! Disabled → Initializing → Running → Ending → Finished
//! ```
//!
//! `initialize` runs the cycle a command is scheduled; the first `execute`
//! lands the following cycle; `end` runs the cycle completion is detected or
//! interruption occurs. A command with an empty requirement set and no
//! finishing predicate legally runs forever until canceled.

use std::fmt;

use thiserror::Error;

use helm_common::input::InputFrame;
use helm_common::output::ActuatorBank;

use crate::resource::ResourceSet;

pub mod func;
pub mod group;

// ─── Identity ───────────────────────────────────────────────────────

/// Monotonic identity of one scheduled command instance.
///
/// Ids are minted by the scheduler and never reused, so a stale id held by
/// a binding slot can never alias a later command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

// ─── Lifecycle ──────────────────────────────────────────────────────

/// Lifecycle state of a command as tracked by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CommandState {
    /// Not scheduled (never issued or not known to the scheduler).
    #[default]
    Disabled = 0,
    /// Scheduled this cycle; `initialize` has run, first `execute` is next cycle.
    Initializing = 1,
    /// Holds all declared resources and executes one step per cycle.
    Running = 2,
    /// `end` callback in progress.
    Ending = 3,
    /// Lifecycle complete; the instance is destroyed.
    Finished = 4,
}

impl CommandState {
    /// Whether the command currently occupies a scheduler slot.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Initializing | Self::Running | Self::Ending)
    }
}

/// What happens when another command wants this command's resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum InterruptPolicy {
    /// May be interrupted; `end(interrupted = true)` runs and resources move.
    #[default]
    Interruptible = 0,
    /// Conflicting schedule requests are rejected while this command runs.
    NonInterruptible = 1,
}

// ─── Step faults ────────────────────────────────────────────────────

/// Unexpected fault raised by a command's execute step.
///
/// The scheduler ends the faulting command (interrupted), releases its
/// resources, reports the fault to the tracing sink, and keeps the loop
/// running.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StepFault(String);

impl StepFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result of one execute step.
pub type StepResult = Result<(), StepFault>;

// ─── Execution context ──────────────────────────────────────────────

/// Per-cycle context handed to every command callback.
///
/// Commands read this cycle's sampled input and write demanded outputs into
/// the actuator bank; they never touch hardware directly.
pub struct CycleCtx<'a> {
    /// Control cycle index.
    pub cycle: u64,
    /// Operator input sampled at the start of this cycle.
    pub input: &'a InputFrame,
    /// Demanded actuator outputs, mirrored by the hardware layer after the cycle.
    pub outputs: &'a mut ActuatorBank,
}

// ─── The trait ──────────────────────────────────────────────────────

/// A schedulable unit of robot behavior.
///
/// All callbacks run on the control thread; they must not block.
pub trait Command {
    /// Human-readable name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Resources this command needs exclusively for its whole lifetime.
    fn requirements(&self) -> ResourceSet;

    /// Conflict behavior; defaults to interruptible.
    fn interrupt_policy(&self) -> InterruptPolicy {
        InterruptPolicy::Interruptible
    }

    /// Runs once, the cycle the command is scheduled.
    fn initialize(&mut self, _ctx: &mut CycleCtx<'_>) {}

    /// Runs once per cycle from the cycle after scheduling until the end.
    fn execute(&mut self, ctx: &mut CycleCtx<'_>) -> StepResult;

    /// Completion predicate, evaluated once per cycle by the scheduler.
    fn is_finished(&self) -> bool {
        false
    }

    /// Runs once when the command completes or is interrupted.
    fn end(&mut self, _ctx: &mut CycleCtx<'_>, _interrupted: bool) {}
}

/// Builds a fresh command instance on demand.
///
/// Factories live in binding slots, resource defaults, and the autonomous
/// chooser; every schedule produces a new instance.
pub type CommandFactory = Box<dyn Fn() -> Box<dyn Command>>;
