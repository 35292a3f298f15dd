//! Closure-backed command adapters.
//!
//! Most operator-facing behaviors are a closure over the cycle context plus
//! a requirement set; these adapters avoid a bespoke struct per behavior.

use crate::command::{Command, CycleCtx, InterruptPolicy, StepResult};
use crate::resource::ResourceSet;

type StepFn = Box<dyn FnMut(&mut CycleCtx<'_>)>;
type EndFn = Box<dyn FnMut(&mut CycleCtx<'_>)>;

// ─── RunCommand ─────────────────────────────────────────────────────

/// Runs a closure every cycle and never finishes on its own.
///
/// The workhorse for held-button behaviors and resource defaults: schedule
/// keeps it stepping until canceled or interrupted. An optional end closure
/// runs on the way out (typically zeroing what the step demanded).
pub struct RunCommand {
    name: String,
    requirements: ResourceSet,
    step: StepFn,
    on_end: Option<EndFn>,
    policy: InterruptPolicy,
}

impl RunCommand {
    pub fn new(
        name: impl Into<String>,
        requirements: ResourceSet,
        step: impl FnMut(&mut CycleCtx<'_>) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            requirements,
            step: Box::new(step),
            on_end: None,
            policy: InterruptPolicy::Interruptible,
        }
    }

    /// Closure to run when the command ends, normally or interrupted.
    #[must_use]
    pub fn with_end(mut self, on_end: impl FnMut(&mut CycleCtx<'_>) + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }

    /// Reject conflicting schedule requests instead of yielding.
    #[must_use]
    pub fn non_interruptible(mut self) -> Self {
        self.policy = InterruptPolicy::NonInterruptible;
        self
    }
}

impl Command for RunCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn interrupt_policy(&self) -> InterruptPolicy {
        self.policy
    }

    fn execute(&mut self, ctx: &mut CycleCtx<'_>) -> StepResult {
        (self.step)(ctx);
        Ok(())
    }

    fn end(&mut self, ctx: &mut CycleCtx<'_>, _interrupted: bool) {
        if let Some(on_end) = self.on_end.as_mut() {
            on_end(ctx);
        }
    }
}

// ─── InstantCommand ─────────────────────────────────────────────────

/// Performs its work once in `initialize` and finishes immediately.
///
/// Because first execute always lands the cycle after scheduling, an
/// instant command never executes: it initializes, reports finished, and is
/// swept the same cycle. Toggles and one-shot actions live here.
pub struct InstantCommand {
    name: String,
    requirements: ResourceSet,
    action: Option<Box<dyn FnOnce(&mut CycleCtx<'_>)>>,
}

impl InstantCommand {
    pub fn new(
        name: impl Into<String>,
        requirements: ResourceSet,
        action: impl FnOnce(&mut CycleCtx<'_>) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            requirements,
            action: Some(Box::new(action)),
        }
    }
}

impl Command for InstantCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn initialize(&mut self, ctx: &mut CycleCtx<'_>) {
        if let Some(action) = self.action.take() {
            action(ctx);
        }
    }

    fn execute(&mut self, _ctx: &mut CycleCtx<'_>) -> StepResult {
        Ok(())
    }

    fn is_finished(&self) -> bool {
        true
    }
}

// ─── TimedCommand ───────────────────────────────────────────────────

/// Runs a closure every cycle for a fixed number of cycles, then finishes.
pub struct TimedCommand {
    name: String,
    requirements: ResourceSet,
    step: StepFn,
    on_end: Option<EndFn>,
    remaining: u64,
}

impl TimedCommand {
    pub fn new(
        name: impl Into<String>,
        requirements: ResourceSet,
        cycles: u64,
        step: impl FnMut(&mut CycleCtx<'_>) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            requirements,
            step: Box::new(step),
            on_end: None,
            remaining: cycles,
        }
    }

    /// Closure to run when the command ends, normally or interrupted.
    #[must_use]
    pub fn with_end(mut self, on_end: impl FnMut(&mut CycleCtx<'_>) + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }
}

impl Command for TimedCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn execute(&mut self, ctx: &mut CycleCtx<'_>) -> StepResult {
        (self.step)(ctx);
        self.remaining = self.remaining.saturating_sub(1);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    fn end(&mut self, ctx: &mut CycleCtx<'_>, _interrupted: bool) {
        if let Some(on_end) = self.on_end.as_mut() {
            on_end(ctx);
        }
    }
}
