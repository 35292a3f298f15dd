//! Subsystem registry: one exclusive resource per actuated mechanism.
//!
//! Channel constants mirror the wiring sheet. Each subsystem owns its
//! own actuator unit, so most single-motor mechanisms drive channel 0.

use helm_core::resource::{ResourceError, ResourceId, ResourceTable};

// ─── Motor channels ─────────────────────────────────────────────────

/// Left side of the drivetrain gearbox.
pub const DRIVE_LEFT: usize = 0;
/// Right side of the drivetrain gearbox.
pub const DRIVE_RIGHT: usize = 1;
/// Intake roller bar.
pub const INTAKE_ROLLER: usize = 0;
/// Magazine conveyor belt.
pub const MAGAZINE_BELT: usize = 0;
/// Climbing mast extension motor.
pub const MAST_MOTOR: usize = 0;
/// Shooter flywheel.
pub const FLYWHEEL: usize = 0;
/// Winch drum for the climb.
pub const WINCH_DRUM: usize = 0;

// ─── Solenoid channels ──────────────────────────────────────────────

/// Drivetrain two-speed gearbox shifter.
pub const GEARBOX_SHIFT: usize = 0;
/// Intake deploy joint.
pub const INTAKE_JOINT: usize = 0;
/// Compressor enable relay.
pub const COMPRESSOR: usize = 0;
/// Spinner arm lift cylinder.
pub const SPINNER_LIFT: usize = 0;

// ─── Registry ───────────────────────────────────────────────────────

/// Resource handles for every mechanism on the robot.
///
/// Handles are plain indices into the [`ResourceTable`] they were
/// registered with, so the struct is freely copyable into command
/// closures.
#[derive(Debug, Clone, Copy)]
pub struct Subsystems {
    pub drive: ResourceId,
    pub intake: ResourceId,
    pub magazine: ResourceId,
    pub mast: ResourceId,
    pub pneumatics: ResourceId,
    pub shooter: ResourceId,
    pub spinner: ResourceId,
    pub winch: ResourceId,
}

impl Subsystems {
    /// Registers all subsystems in wiring order.
    pub fn register(table: &mut ResourceTable) -> Result<Self, ResourceError> {
        Ok(Self {
            drive: table.register("drive")?,
            intake: table.register("intake")?,
            magazine: table.register("magazine")?,
            mast: table.register("mast")?,
            pneumatics: table.register("pneumatics")?,
            shooter: table.register("shooter")?,
            spinner: table.register("spinner")?,
            winch: table.register("winch")?,
        })
    }
}
