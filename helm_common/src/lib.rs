//! Helm Common Library
//!
//! This crate provides the shared types used by every Helm workspace crate:
//! the operator input model, the actuator output bank, and configuration
//! loading utilities.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide constants (capacities, cycle timing)
//! - [`input`] - Gamepad model: buttons, axes, D-pad, sampled frames
//! - [`output`] - Actuator output bank written by commands each cycle
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use helm_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod input;
pub mod output;
pub mod prelude;
