//! # Helm Core Library
//!
//! Command dispatch and resource-exclusive scheduling for a robot built from
//! independently actuated subsystems. Operator intent (buttons, axes, D-pad)
//! is turned into prioritized, mutually exclusive commands over shared
//! hardware via a deterministic single-threaded control cycle.
//!
//! ## Architecture
//!
//! 1. **Resources**: named exclusive handles over actuator groups, with an
//!    optional default command that runs whenever nothing else claims them
//! 2. **Triggers**: per-cycle sampled input conditions classified into
//!    rising/falling/steady edges, memoized once per cycle
//! 3. **Bindings**: an immutable table firing schedule/cancel requests from
//!    trigger edges, applied in registration order
//! 4. **Scheduler**: all-or-nothing conflict resolution, FIFO execute
//!    order, default-command backfill
//! 5. **Groups**: sequential and parallel command composition
//! 6. **Cycle runner**: sample → classify → bind → tick at a fixed rate
//!
//! ## Cooperative Single-Threaded Loop
//!
//! Every callback runs on the control thread and must return quickly; there
//! is no preemption inside a cycle. Commands are created on demand by
//! factories held in the binding table, resource defaults, and the
//! autonomous chooser, and are destroyed once finished.

#![deny(clippy::disallowed_types)]

pub mod auto;
pub mod binding;
pub mod command;
pub mod cycle;
pub mod phase;
pub mod resource;
pub mod scheduler;
pub mod trigger;
