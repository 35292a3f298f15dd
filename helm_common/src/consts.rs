//! System-wide constants for the Helm workspace.
//!
//! Single source of truth for capacity limits and cycle timing.
//! Imported by all crates; no duplication permitted.

use std::time::Duration;

/// Maximum number of registered resources (actuator groups).
///
/// Bounded at 64 so a requirement set fits a single `u64` bitmask.
pub const MAX_RESOURCES: usize = 64;

/// Maximum number of operator gamepads (driver-station ports).
pub const MAX_PADS: usize = 4;

/// Motor power channels per resource.
pub const MOTOR_CHANNELS: usize = 4;

/// Solenoid channels per resource.
pub const SOLENOID_CHANNELS: usize = 4;

/// Default control cycle rate in Hz (20 ms period).
pub const DEFAULT_CYCLE_HZ: u32 = 50;

/// Default control cycle period as Duration.
pub const DEFAULT_CYCLE_TIME: Duration =
    Duration::from_millis((1000 / DEFAULT_CYCLE_HZ) as u64);
