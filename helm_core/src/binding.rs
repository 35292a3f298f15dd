//! Declarative associations between trigger edges and command actions.
//!
//! The table owns the triggers and a set of named command slots (factories).
//! Every cycle the runner refreshes all triggers once, then
//! [`apply`](BindingTable::apply) runs one complete evaluation pass: every
//! binding is read against this cycle's memoized edges to produce a request
//! list, and the requests are applied to the scheduler in binding
//! registration order. No scheduler mutation happens mid-evaluation, so all
//! bindings of a cycle observe the same edge picture.
//!
//! Bindings are immutable once installed. Installation validates every
//! referenced trigger, slot, and resource; a bad binding fails at
//! configuration load, not at runtime.

use thiserror::Error;
use tracing::debug;

use helm_common::input::InputFrame;

use crate::command::{CommandFactory, CommandId, CycleCtx};
use crate::resource::{ResourceId, ResourceTable};
use crate::scheduler::{ScheduleOutcome, Scheduler};
use crate::trigger::{Edge, Trigger};

// ─── Handles ────────────────────────────────────────────────────────

/// Handle to a trigger owned by a [`BindingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(usize);

/// Handle to a command slot owned by a [`BindingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

// ─── Actions ────────────────────────────────────────────────────────

/// What a binding does with its trigger's edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAction {
    /// Schedule a fresh instance of the slot's command on the rising edge.
    SchedulePress,
    /// Cancel the slot's live command on the falling edge.
    CancelRelease,
    /// Schedule on the rising edge, cancel on the falling edge. Steady-high
    /// cycles take no action; the command runs on its own predicate.
    WhileHeld,
    /// Schedule on the rising edge; cancel when `opposite` has its rising
    /// edge.
    PressUntilOpposite { opposite: TriggerId },
}

/// Edge classes a binding listens on; used for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Rising,
    Falling,
}

/// The (trigger, edge) pairs covered by one binding.
fn coverage(action: BindAction, trigger: TriggerId) -> Vec<(TriggerId, EdgeKind)> {
    match action {
        BindAction::SchedulePress => vec![(trigger, EdgeKind::Rising)],
        BindAction::CancelRelease => vec![(trigger, EdgeKind::Falling)],
        BindAction::WhileHeld => vec![
            (trigger, EdgeKind::Rising),
            (trigger, EdgeKind::Falling),
        ],
        BindAction::PressUntilOpposite { opposite } => vec![
            (trigger, EdgeKind::Rising),
            (opposite, EdgeKind::Rising),
        ],
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Configuration-time binding faults. All of these are programmer errors
/// and abort startup.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The trigger handle was not minted by this table.
    #[error("binding references unknown trigger {0:?}")]
    UnknownTrigger(TriggerId),

    /// The command slot handle was not minted by this table.
    #[error("binding references unknown command slot {0:?}")]
    UnknownCommand(SlotId),

    /// The slot's commands require a resource the table never registered.
    #[error("command '{command}' requires unregistered resource id {resource}")]
    UnknownResource {
        command: String,
        resource: ResourceId,
    },

    /// Two bindings would cover the same (trigger, edge) pair for one slot.
    #[error("duplicate binding: trigger '{trigger}' edge already drives command '{command}'")]
    DuplicateBinding { trigger: String, command: String },
}

// ─── Table ──────────────────────────────────────────────────────────

struct CommandSlot {
    name: String,
    factory: CommandFactory,
    /// Id of the most recently scheduled instance. Stale once that instance
    /// finishes; ids are never reused, so a stale cancel is a no-op.
    live: Option<CommandId>,
}

struct Binding {
    trigger: TriggerId,
    action: BindAction,
    slot: SlotId,
}

#[derive(Debug, Clone, Copy)]
enum Request {
    Schedule(SlotId),
    Cancel(SlotId),
}

/// The installed binding set plus the triggers and command slots it wires
/// together.
#[derive(Default)]
pub struct BindingTable {
    triggers: Vec<Trigger>,
    slots: Vec<CommandSlot>,
    bindings: Vec<Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a trigger; the returned handle names it in `bind` calls.
    pub fn add_trigger(&mut self, trigger: Trigger) -> TriggerId {
        self.triggers.push(trigger);
        TriggerId(self.triggers.len() - 1)
    }

    /// Register a command factory under a slot name.
    ///
    /// The factory is probed once so a slot whose commands require an
    /// unregistered resource fails here instead of silently never running.
    pub fn register_command(
        &mut self,
        name: impl Into<String>,
        factory: CommandFactory,
        resources: &ResourceTable,
    ) -> Result<SlotId, BindingError> {
        let name = name.into();
        let probe = factory();
        for resource in probe.requirements().iter() {
            if !resources.contains(resource) {
                return Err(BindingError::UnknownResource {
                    command: name,
                    resource,
                });
            }
        }
        self.slots.push(CommandSlot {
            name,
            factory,
            live: None,
        });
        Ok(SlotId(self.slots.len() - 1))
    }

    /// Install one binding. At most one action may cover a given
    /// (trigger, edge) pair for the same slot; fan-out to distinct slots is
    /// fine.
    pub fn bind(
        &mut self,
        trigger: TriggerId,
        action: BindAction,
        slot: SlotId,
    ) -> Result<(), BindingError> {
        if trigger.0 >= self.triggers.len() {
            return Err(BindingError::UnknownTrigger(trigger));
        }
        if let BindAction::PressUntilOpposite { opposite } = action {
            if opposite.0 >= self.triggers.len() {
                return Err(BindingError::UnknownTrigger(opposite));
            }
        }
        if slot.0 >= self.slots.len() {
            return Err(BindingError::UnknownCommand(slot));
        }

        let wanted = coverage(action, trigger);
        let mut taken: Vec<(TriggerId, EdgeKind)> = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.slot == slot) {
            taken.extend(coverage(binding.action, binding.trigger));
        }
        for pair in &wanted {
            // Counting the pair in `wanted` itself catches an action whose
            // opposite trigger is its own trigger.
            let dup_within = wanted.iter().filter(|p| *p == pair).count() > 1;
            if dup_within || taken.contains(pair) {
                return Err(BindingError::DuplicateBinding {
                    trigger: self.triggers[pair.0.0].name().to_string(),
                    command: self.slots[slot.0].name.clone(),
                });
            }
        }

        self.bindings.push(Binding {
            trigger,
            action,
            slot,
        });
        Ok(())
    }

    /// Refresh every trigger's edge for this cycle (memoized per cycle).
    pub fn refresh(&mut self, cycle: u64, frame: &InputFrame) {
        for trigger in &mut self.triggers {
            trigger.refresh(cycle, frame);
        }
    }

    /// Evaluate all bindings against this cycle's edges, then apply the
    /// resulting schedule and cancel requests in registration order.
    pub fn apply(&mut self, scheduler: &mut Scheduler, ctx: &mut CycleCtx<'_>) {
        for request in self.collect() {
            match request {
                Request::Schedule(slot_id) => {
                    let slot = &mut self.slots[slot_id.0];
                    if let Some(live) = slot.live {
                        if scheduler.is_active(live) {
                            debug!(
                                command = slot.name.as_str(),
                                "schedule skipped: instance already active"
                            );
                            continue;
                        }
                    }
                    let command = (slot.factory)();
                    match scheduler.schedule(command, ctx) {
                        ScheduleOutcome::Scheduled(id) => slot.live = Some(id),
                        ScheduleOutcome::Rejected(reason) => {
                            debug!(
                                command = slot.name.as_str(),
                                ?reason,
                                "binding schedule rejected"
                            );
                        }
                    }
                }
                Request::Cancel(slot_id) => {
                    if let Some(live) = self.slots[slot_id.0].live.take() {
                        scheduler.cancel(live, ctx);
                    }
                }
            }
        }
    }

    /// One complete read-only pass over the bindings.
    fn collect(&self) -> Vec<Request> {
        let mut requests = Vec::new();
        for binding in &self.bindings {
            let edge = self.edge_of(binding.trigger);
            match binding.action {
                BindAction::SchedulePress => {
                    if edge.is_rising() {
                        requests.push(Request::Schedule(binding.slot));
                    }
                }
                BindAction::CancelRelease => {
                    if edge.is_falling() {
                        requests.push(Request::Cancel(binding.slot));
                    }
                }
                BindAction::WhileHeld => {
                    if edge.is_rising() {
                        requests.push(Request::Schedule(binding.slot));
                    }
                    if edge.is_falling() {
                        requests.push(Request::Cancel(binding.slot));
                    }
                }
                BindAction::PressUntilOpposite { opposite } => {
                    // Schedule before cancel, so opposite edges landing in
                    // the same cycle net out to a canceled command.
                    if edge.is_rising() {
                        requests.push(Request::Schedule(binding.slot));
                    }
                    if self.edge_of(opposite).is_rising() {
                        requests.push(Request::Cancel(binding.slot));
                    }
                }
            }
        }
        requests
    }

    fn edge_of(&self, id: TriggerId) -> Edge {
        self.triggers[id.0].edge().unwrap_or(Edge::SteadyLow)
    }

    // ─── Introspection ──────────────────────────────────────────────

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn command_count(&self) -> usize {
        self.slots.len()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Slot name, for startup listings.
    pub fn command_name(&self, slot: SlotId) -> Option<&str> {
        self.slots.get(slot.0).map(|s| s.name.as_str())
    }

    /// Most recently scheduled instance of a slot (may be stale).
    pub fn live(&self, slot: SlotId) -> Option<CommandId> {
        self.slots.get(slot.0).and_then(|s| s.live)
    }
}
