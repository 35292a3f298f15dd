//! Resource registry: named exclusive handles over actuator groups.
//!
//! A resource (drivetrain, intake, ...) is held by at most one command at a
//! time. The table tracks the current holder per resource and the optional
//! default-command factory used for backfill when a resource goes idle.
//!
//! Resource ids are dense indexes minted at registration; the table is
//! bounded at [`MAX_RESOURCES`] so a whole requirement set fits one `u64`
//! bitmask ([`ResourceSet`]).

use heapless::Vec as BoundedVec;
use static_assertions::const_assert;
use thiserror::Error;

use helm_common::consts::MAX_RESOURCES;

use crate::command::{CommandFactory, CommandId, InterruptPolicy};

// ResourceSet packs one bit per resource id.
const_assert!(MAX_RESOURCES <= 64);

/// Dense resource index minted by [`ResourceTable::register`].
pub type ResourceId = u8;

// ─── Requirement sets ───────────────────────────────────────────────

/// Set of resource ids as a `u64` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceSet(u64);

impl ResourceSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Set containing exactly the given ids.
    ///
    /// Ids must be below [`MAX_RESOURCES`]; ids are only minted by a
    /// [`ResourceTable`], which enforces the bound.
    pub const fn of(ids: &[ResourceId]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < ids.len() {
            bits |= 1u64 << ids[i];
            i += 1;
        }
        Self(bits)
    }

    /// This set plus one id.
    #[must_use]
    pub const fn with(self, id: ResourceId) -> Self {
        Self(self.0 | (1u64 << id))
    }

    #[inline]
    pub const fn contains(self, id: ResourceId) -> bool {
        self.0 & (1u64 << id) != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of ids in the set.
    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate ids in ascending order.
    pub fn iter(self) -> ResourceSetIter {
        ResourceSetIter { bits: self.0 }
    }
}

/// Ascending-order iterator over a [`ResourceSet`].
#[derive(Debug, Clone)]
pub struct ResourceSetIter {
    bits: u64,
}

impl Iterator for ResourceSetIter {
    type Item = ResourceId;

    fn next(&mut self) -> Option<ResourceId> {
        if self.bits == 0 {
            return None;
        }
        let id = self.bits.trailing_zeros() as ResourceId;
        self.bits &= self.bits - 1;
        Some(id)
    }
}

// ─── Table ──────────────────────────────────────────────────────────

/// Error type for resource registration and default installation.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The table already holds [`MAX_RESOURCES`] entries.
    #[error("resource table full ({max} resources)")]
    TableFull { max: usize },

    /// A resource with this name is already registered.
    #[error("duplicate resource name '{0}'")]
    DuplicateName(String),

    /// The id does not belong to this table.
    #[error("unknown resource id {0}")]
    UnknownId(ResourceId),

    /// A default command must require exactly its own resource.
    #[error("default command '{command}' for resource '{resource}' must require exactly that resource")]
    DefaultRequirements { command: String, resource: String },

    /// Default commands must stay interruptible so operator intent wins.
    #[error("default command '{command}' for resource '{resource}' must be interruptible")]
    DefaultNotInterruptible { command: String, resource: String },
}

struct ResourceSlot {
    name: String,
    holder: Option<CommandId>,
    default_factory: Option<CommandFactory>,
}

/// Registry of all resources, their holders, and their default factories.
pub struct ResourceTable {
    slots: BoundedVec<ResourceSlot, MAX_RESOURCES>,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    pub fn new() -> Self {
        Self {
            slots: BoundedVec::new(),
        }
    }

    /// Register a resource, minting the next dense id.
    pub fn register(&mut self, name: impl Into<String>) -> Result<ResourceId, ResourceError> {
        let name = name.into();
        if self.slots.iter().any(|s| s.name == name) {
            return Err(ResourceError::DuplicateName(name));
        }
        let id = self.slots.len() as ResourceId;
        self.slots
            .push(ResourceSlot {
                name,
                holder: None,
                default_factory: None,
            })
            .map_err(|_| ResourceError::TableFull {
                max: MAX_RESOURCES,
            })?;
        Ok(id)
    }

    /// Install the default-command factory for `id`.
    ///
    /// The factory is probed once: its commands must require exactly this
    /// resource and stay interruptible, otherwise backfill could deadlock
    /// operator intent behind an unkillable filler.
    pub fn set_default(
        &mut self,
        id: ResourceId,
        factory: CommandFactory,
    ) -> Result<(), ResourceError> {
        if !self.contains(id) {
            return Err(ResourceError::UnknownId(id));
        }
        let probe = factory();
        if probe.requirements() != ResourceSet::of(&[id]) {
            return Err(ResourceError::DefaultRequirements {
                command: probe.name().to_string(),
                resource: self.slots[id as usize].name.clone(),
            });
        }
        if probe.interrupt_policy() != InterruptPolicy::Interruptible {
            return Err(ResourceError::DefaultNotInterruptible {
                command: probe.name().to_string(),
                resource: self.slots[id as usize].name.clone(),
            });
        }
        self.slots[id as usize].default_factory = Some(factory);
        Ok(())
    }

    /// Number of registered resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `id` was minted by this table.
    #[inline]
    pub fn contains(&self, id: ResourceId) -> bool {
        (id as usize) < self.slots.len()
    }

    /// Name of a registered resource.
    pub fn name(&self, id: ResourceId) -> Option<&str> {
        self.slots.get(id as usize).map(|s| s.name.as_str())
    }

    /// All ids minted so far, ascending.
    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + use<> {
        0..self.slots.len() as ResourceId
    }

    /// Whether every id in `set` is registered here.
    pub fn covers(&self, set: ResourceSet) -> bool {
        set.iter().all(|id| self.contains(id))
    }

    /// Current holder of a resource.
    pub fn holder(&self, id: ResourceId) -> Option<CommandId> {
        self.slots.get(id as usize).and_then(|s| s.holder)
    }

    pub(crate) fn set_holder(&mut self, id: ResourceId, command: CommandId) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            slot.holder = Some(command);
        }
    }

    /// Release every resource held by `command`.
    pub(crate) fn release_all(&mut self, command: CommandId) {
        for slot in self.slots.iter_mut() {
            if slot.holder == Some(command) {
                slot.holder = None;
            }
        }
    }

    pub(crate) fn default_factory(&self, id: ResourceId) -> Option<&CommandFactory> {
        self.slots
            .get(id as usize)
            .and_then(|s| s.default_factory.as_ref())
    }
}
