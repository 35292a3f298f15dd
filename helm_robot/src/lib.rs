//! Competition robot assembly on top of the `helm_core` scheduler.
//!
//! This crate owns everything specific to one robot: the subsystem
//! registry, the operator binding map, the command factories with their
//! tuned powers, configuration loading, and a scripted input source for
//! desktop simulation. The binary in `main.rs` wires it all into a
//! [`helm_core::cycle::CycleRunner`].

pub mod bindings;
pub mod commands;
pub mod config;
pub mod sim;
pub mod subsystems;
