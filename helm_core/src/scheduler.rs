//! FIFO command scheduler with exclusive resource arbitration.
//!
//! The scheduler owns the [`ResourceTable`] and the active command set. A
//! schedule request is arbitrated all-or-nothing: either every required
//! resource can be claimed (interrupting interruptible holders) or the
//! request is rejected and nothing changes. Rejection is silent at this
//! level; callers poll the returned [`ScheduleOutcome`].
//!
//! One [`tick`](Scheduler::tick) advances a control cycle in three passes:
//!
//! 1. completion sweep: finished commands end normally and release,
//! 2. default backfill: idle resources with a default factory get a fresh
//!    default command scheduled,
//! 3. execute pass: active commands step once each, in schedule order.
//!
//! A command scheduled during a cycle (by a binding or by backfill) is
//! promoted from `Initializing` to `Running` in that cycle's execute pass
//! without stepping, so its first execute lands the following cycle and a
//! resource is never driven by two commands in one cycle.

use tracing::{debug, error};

use crate::command::{Command, CommandId, CommandState, CycleCtx, InterruptPolicy, StepFault};
use crate::resource::{ResourceId, ResourceSet, ResourceTable};

// ─── Outcomes ───────────────────────────────────────────────────────

/// Why a schedule request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A required resource is held by a command that refuses interruption.
    NonInterruptibleHolder { holder: CommandId },
    /// The command requires a resource id the table never minted.
    UnknownResource { resource: ResourceId },
}

/// Poll-able result of a schedule request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The command was admitted and initialized; first execute is next cycle.
    Scheduled(CommandId),
    /// The command was discarded; no resource changed hands.
    Rejected(RejectReason),
}

impl ScheduleOutcome {
    pub const fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }

    /// The admitted command's id, if any.
    pub const fn id(&self) -> Option<CommandId> {
        match self {
            Self::Scheduled(id) => Some(*id),
            Self::Rejected(_) => None,
        }
    }
}

// ─── Scheduler ──────────────────────────────────────────────────────

struct Active {
    id: CommandId,
    command: Box<dyn Command>,
    /// Requirements captured at schedule time; holder bookkeeping keys off
    /// this snapshot, not off later calls into the command.
    requirements: ResourceSet,
    state: CommandState,
    /// Set when this instance was backfilled as a resource default.
    default_for: Option<ResourceId>,
}

/// Single-threaded command scheduler. See the module docs for the cycle
/// contract.
pub struct Scheduler {
    resources: ResourceTable,
    /// Active commands in schedule order (the execute pass is FIFO).
    active: Vec<Active>,
    /// Next id to mint; ids start at 1 and are never reused.
    next_id: u64,
}

impl Scheduler {
    /// Take ownership of a fully registered resource table.
    pub fn new(resources: ResourceTable) -> Self {
        Self {
            resources,
            active: Vec::new(),
            next_id: 1,
        }
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    /// Request a command start. Arbitration is all-or-nothing: on success
    /// every interruptible holder of a required resource has been ended
    /// (interrupted) and the command has initialized; on rejection nothing
    /// was touched.
    pub fn schedule(
        &mut self,
        command: Box<dyn Command>,
        ctx: &mut CycleCtx<'_>,
    ) -> ScheduleOutcome {
        self.schedule_inner(command, None, ctx)
    }

    fn schedule_inner(
        &mut self,
        mut command: Box<dyn Command>,
        default_for: Option<ResourceId>,
        ctx: &mut CycleCtx<'_>,
    ) -> ScheduleOutcome {
        let requirements = command.requirements();

        for rid in requirements.iter() {
            if !self.resources.contains(rid) {
                debug!(
                    command = command.name(),
                    resource = rid,
                    "schedule rejected: unknown resource"
                );
                return ScheduleOutcome::Rejected(RejectReason::UnknownResource { resource: rid });
            }
        }

        // First pass over the holders decides the whole request before any
        // state changes, so a non-interruptible holder anywhere rejects the
        // request without disturbing holders elsewhere.
        let mut to_interrupt: Vec<CommandId> = Vec::new();
        for rid in requirements.iter() {
            let Some(holder) = self.resources.holder(rid) else {
                continue;
            };
            let Some(entry) = self.active.iter().find(|a| a.id == holder) else {
                continue;
            };
            if entry.command.interrupt_policy() == InterruptPolicy::NonInterruptible {
                debug!(
                    command = command.name(),
                    resource = self.resources.name(rid).unwrap_or(""),
                    holder = entry.command.name(),
                    "schedule rejected: resource held non-interruptibly"
                );
                return ScheduleOutcome::Rejected(RejectReason::NonInterruptibleHolder { holder });
            }
            if !to_interrupt.contains(&holder) {
                to_interrupt.push(holder);
            }
        }

        for holder in to_interrupt {
            self.finish(holder, true, ctx);
        }

        let id = CommandId::new(self.next_id);
        self.next_id += 1;
        for rid in requirements.iter() {
            self.resources.set_holder(rid, id);
        }

        debug!(command = command.name(), %id, "command scheduled");
        command.initialize(ctx);
        self.active.push(Active {
            id,
            command,
            requirements,
            state: CommandState::Initializing,
            default_for,
        });
        ScheduleOutcome::Scheduled(id)
    }

    /// End a command now, interrupted. Takes effect before the next execute
    /// pass; the `end` callback runs exactly once. Returns false if the id
    /// is not active (stale ids are harmless).
    pub fn cancel(&mut self, id: CommandId, ctx: &mut CycleCtx<'_>) -> bool {
        if self.active.iter().any(|a| a.id == id) {
            self.finish(id, true, ctx);
            true
        } else {
            debug!(%id, "cancel ignored: not active");
            false
        }
    }

    /// Interrupt every active command and release all resources.
    pub fn cancel_all(&mut self, ctx: &mut CycleCtx<'_>) {
        let ids: Vec<CommandId> = self.active.iter().map(|a| a.id).collect();
        for id in ids {
            self.finish(id, true, ctx);
        }
    }

    /// Advance one control cycle: completion sweep, default backfill, then
    /// the FIFO execute pass.
    pub fn tick(&mut self, ctx: &mut CycleCtx<'_>) {
        // (1) Completion sweep.
        let done: Vec<CommandId> = self
            .active
            .iter()
            .filter(|a| a.command.is_finished())
            .map(|a| a.id)
            .collect();
        for id in done {
            self.finish(id, false, ctx);
        }

        // (2) Default backfill. Defaults require exactly their own resource,
        // so scheduling one can never interrupt or conflict.
        let idle: Vec<ResourceId> = self
            .resources
            .ids()
            .filter(|&rid| {
                self.resources.holder(rid).is_none()
                    && self.resources.default_factory(rid).is_some()
            })
            .collect();
        for rid in idle {
            let command = {
                let Some(factory) = self.resources.default_factory(rid) else {
                    continue;
                };
                factory()
            };
            debug!(
                resource = self.resources.name(rid).unwrap_or(""),
                command = command.name(),
                "backfilling default command"
            );
            self.schedule_inner(command, Some(rid), ctx);
        }

        // (3) Execute pass in schedule order. Commands scheduled this cycle
        // only promote; faults are collected and resolved after the pass so
        // the sweep order stays stable.
        let mut faulted: Vec<(CommandId, StepFault)> = Vec::new();
        for entry in self.active.iter_mut() {
            match entry.state {
                CommandState::Initializing => {
                    entry.state = CommandState::Running;
                }
                CommandState::Running => {
                    if let Err(fault) = entry.command.execute(ctx) {
                        faulted.push((entry.id, fault));
                    }
                }
                _ => {}
            }
        }
        for (id, fault) in faulted {
            let name = self
                .active
                .iter()
                .find(|a| a.id == id)
                .map(|a| a.command.name().to_string())
                .unwrap_or_default();
            error!(command = %name, %id, %fault, "execute step faulted; command interrupted");
            self.finish(id, true, ctx);
        }
    }

    fn finish(&mut self, id: CommandId, interrupted: bool, ctx: &mut CycleCtx<'_>) {
        let Some(pos) = self.active.iter().position(|a| a.id == id) else {
            return;
        };
        // Remove preserves the FIFO order of the remaining commands.
        let mut entry = self.active.remove(pos);
        entry.state = CommandState::Ending;
        entry.command.end(ctx, interrupted);
        self.resources.release_all(id);
        entry.state = CommandState::Finished;
        debug!(
            command = entry.command.name(),
            %id,
            interrupted,
            default_for = ?entry.default_for,
            "command finished"
        );
        // The instance drops here; the id stays retired.
    }

    // ─── Introspection ──────────────────────────────────────────────

    /// Lifecycle state of an id: active commands report their live state,
    /// retired ids report `Finished`, never-minted ids report `Disabled`.
    pub fn state_of(&self, id: CommandId) -> CommandState {
        if let Some(entry) = self.active.iter().find(|a| a.id == id) {
            entry.state
        } else if id.raw() > 0 && id.raw() < self.next_id {
            CommandState::Finished
        } else {
            CommandState::Disabled
        }
    }

    pub fn is_active(&self, id: CommandId) -> bool {
        self.active.iter().any(|a| a.id == id)
    }

    /// Current holder of a resource.
    pub fn holder_of(&self, resource: ResourceId) -> Option<CommandId> {
        self.resources.holder(resource)
    }

    /// Number of active commands (defaults included).
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Names of active commands in schedule order.
    pub fn active_names(&self) -> Vec<&str> {
        self.active.iter().map(|a| a.command.name()).collect()
    }
}
