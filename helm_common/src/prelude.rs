//! Prelude module for common re-exports.
//!
//! Consumers can `use helm_common::prelude::*;` and get the most important
//! types without listing individual paths.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_CYCLE_HZ, DEFAULT_CYCLE_TIME, MAX_PADS, MAX_RESOURCES};

// ─── Operator input ─────────────────────────────────────────────────
pub use crate::input::{
    AxisId, ButtonId, DpadDirection, GamepadAxis, GamepadButton, IdleInput, InputFrame,
    InputSource, PadState,
};

// ─── Actuator output ────────────────────────────────────────────────
pub use crate::output::{ActuatorBank, ActuatorOutputs};
