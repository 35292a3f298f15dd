//! Command factories for every robot behavior.
//!
//! Each factory builds a fresh command instance per schedule, closing over
//! the subsystem handles and the tuned constants from [`RobotConfig`].
//! Powers are open-loop duty cycles; shooter speeds are converted to a
//! demand fraction against the configured flywheel maximum.

use helm_common::input::{AxisId, GamepadAxis};
use helm_core::auto::{AutoChooser, ChooserError};
use helm_core::command::func::{InstantCommand, RunCommand, TimedCommand};
use helm_core::command::group::{ParallelGroup, ParallelMode, SequentialGroup};
use helm_core::command::CommandFactory;
use helm_core::resource::{ResourceError, ResourceId, ResourceSet, ResourceTable};

use crate::config::{RobotConfig, ShooterConfig};
use crate::subsystems::{self, Subsystems};

/// Cycles the yaw-align twist runs; vision feedback is not wired yet.
const ALIGN_CYCLES: u64 = 25;
/// Twist power during yaw align.
const ALIGN_POWER: f64 = 0.15;
/// Cycles of forward drive that clear the starting line.
const CROSS_LINE_CYCLES: u64 = 100;
/// Forward power while crossing the line.
const CROSS_LINE_POWER: f64 = 0.4;

// ─── Defaults ───────────────────────────────────────────────────────

/// Default drive: triggers for throttle, left stick for steering.
///
/// Throttle is right trigger minus left trigger, so full reverse is a
/// full left-trigger pull. Steering mixes into the sides tank-style and
/// relies on the bank clamping each channel to `[-1.0, 1.0]`.
pub fn drive_default(subs: Subsystems, driver_port: u8) -> CommandFactory {
    let forward = AxisId::new(driver_port, GamepadAxis::RightTrigger);
    let reverse = AxisId::new(driver_port, GamepadAxis::LeftTrigger);
    let steer = AxisId::new(driver_port, GamepadAxis::LeftX);
    let drive = subs.drive;
    Box::new(move || {
        Box::new(
            RunCommand::new("trigger_drive", ResourceSet::of(&[drive]), move |ctx| {
                let throttle = ctx.input.analog(forward) - ctx.input.analog(reverse);
                let turn = ctx.input.analog(steer);
                let unit = ctx.outputs.unit_mut(drive);
                unit.set_motor(subsystems::DRIVE_LEFT, throttle + turn);
                unit.set_motor(subsystems::DRIVE_RIGHT, throttle - turn);
            })
            .with_end(move |ctx| {
                let unit = ctx.outputs.unit_mut(drive);
                unit.set_motor(subsystems::DRIVE_LEFT, 0.0);
                unit.set_motor(subsystems::DRIVE_RIGHT, 0.0);
            }),
        )
    })
}

/// Default shooter: flywheel follows the operator's right trigger.
pub fn shooter_default(subs: Subsystems, operator_port: u8) -> CommandFactory {
    let trigger = AxisId::new(operator_port, GamepadAxis::RightTrigger);
    let shooter = subs.shooter;
    Box::new(move || {
        Box::new(
            RunCommand::new("shooter_follow", ResourceSet::of(&[shooter]), move |ctx| {
                let demand = ctx.input.analog(trigger);
                ctx.outputs
                    .unit_mut(shooter)
                    .set_motor(subsystems::FLYWHEEL, demand);
            })
            .with_end(move |ctx| {
                ctx.outputs
                    .unit_mut(shooter)
                    .set_motor(subsystems::FLYWHEEL, 0.0);
            }),
        )
    })
}

/// Installs the drive and shooter defaults on their resources.
pub fn install_defaults(
    table: &mut ResourceTable,
    subs: Subsystems,
    config: &RobotConfig,
) -> Result<(), ResourceError> {
    table.set_default(
        subs.drive,
        drive_default(subs, config.controllers.driver_port),
    )?;
    table.set_default(
        subs.shooter,
        shooter_default(subs, config.controllers.operator_port),
    )?;
    Ok(())
}

// ─── Held rollers ───────────────────────────────────────────────────

fn held_motor(
    name: &'static str,
    resource: ResourceId,
    channel: usize,
    power: f64,
) -> CommandFactory {
    Box::new(move || {
        Box::new(
            RunCommand::new(name, ResourceSet::of(&[resource]), move |ctx| {
                ctx.outputs.unit_mut(resource).set_motor(channel, power);
            })
            .with_end(move |ctx| {
                ctx.outputs.unit_mut(resource).set_motor(channel, 0.0);
            }),
        )
    })
}

/// Intake roller pulling game pieces in.
pub fn intake_in(subs: Subsystems, power: f64) -> CommandFactory {
    held_motor("intake_in", subs.intake, subsystems::INTAKE_ROLLER, power)
}

/// Intake roller spitting game pieces back out.
pub fn intake_out(subs: Subsystems, power: f64) -> CommandFactory {
    held_motor("intake_out", subs.intake, subsystems::INTAKE_ROLLER, -power)
}

/// Magazine belt feeding toward the shooter.
pub fn magazine_feed(subs: Subsystems, power: f64) -> CommandFactory {
    held_motor(
        "magazine_feed",
        subs.magazine,
        subsystems::MAGAZINE_BELT,
        power,
    )
}

/// Mast extending for the climb.
pub fn mast_up(subs: Subsystems, power: f64) -> CommandFactory {
    held_motor("mast_up", subs.mast, subsystems::MAST_MOTOR, power)
}

/// Winch winding in to lift the robot.
pub fn winch_retract(subs: Subsystems, power: f64) -> CommandFactory {
    held_motor("winch_retract", subs.winch, subsystems::WINCH_DRUM, power)
}

// ─── Toggles and one-shots ──────────────────────────────────────────

/// Flips the intake deploy joint.
pub fn intake_joint_toggle(subs: Subsystems) -> CommandFactory {
    let intake = subs.intake;
    Box::new(move || {
        Box::new(InstantCommand::new(
            "intake_joint_toggle",
            ResourceSet::of(&[intake]),
            move |ctx| {
                ctx.outputs
                    .unit_mut(intake)
                    .toggle_solenoid(subsystems::INTAKE_JOINT);
            },
        ))
    })
}

/// Flips the compressor enable relay.
pub fn compressor_toggle(subs: Subsystems) -> CommandFactory {
    let pneumatics = subs.pneumatics;
    Box::new(move || {
        Box::new(InstantCommand::new(
            "compressor_toggle",
            ResourceSet::of(&[pneumatics]),
            move |ctx| {
                ctx.outputs
                    .unit_mut(pneumatics)
                    .toggle_solenoid(subsystems::COMPRESSOR);
            },
        ))
    })
}

/// Shifts the drivetrain between its two gears.
pub fn gearbox_toggle(subs: Subsystems) -> CommandFactory {
    let drive = subs.drive;
    Box::new(move || {
        Box::new(InstantCommand::new(
            "gearbox_toggle",
            ResourceSet::of(&[drive]),
            move |ctx| {
                ctx.outputs
                    .unit_mut(drive)
                    .toggle_solenoid(subsystems::GEARBOX_SHIFT);
            },
        ))
    })
}

fn spinner_lift(name: &'static str, subs: Subsystems, raised: bool) -> CommandFactory {
    let spinner = subs.spinner;
    Box::new(move || {
        Box::new(InstantCommand::new(
            name,
            ResourceSet::of(&[spinner]),
            move |ctx| {
                ctx.outputs
                    .unit_mut(spinner)
                    .set_solenoid(subsystems::SPINNER_LIFT, raised);
            },
        ))
    })
}

/// Raises the spinner arm.
pub fn spinner_raise(subs: Subsystems) -> CommandFactory {
    spinner_lift("spinner_raise", subs, true)
}

/// Lowers the spinner arm.
pub fn spinner_lower(subs: Subsystems) -> CommandFactory {
    spinner_lift("spinner_lower", subs, false)
}

/// Cuts flywheel power immediately.
///
/// Interrupts whatever holds the shooter; the default backfills next
/// cycle, so a held trigger brings the wheel right back.
pub fn stop_shooter(subs: Subsystems) -> CommandFactory {
    let shooter = subs.shooter;
    Box::new(move || {
        Box::new(InstantCommand::new(
            "stop_shooter",
            ResourceSet::of(&[shooter]),
            move |ctx| {
                ctx.outputs
                    .unit_mut(shooter)
                    .set_motor(subsystems::FLYWHEEL, 0.0);
            },
        ))
    })
}

/// Holds the flywheel at the bench-test speed while the button is held.
pub fn shooter_speed_test(subs: Subsystems, shooter_cfg: ShooterConfig) -> CommandFactory {
    let shooter = subs.shooter;
    let demand = shooter_cfg.test_speed / shooter_cfg.max_speed;
    Box::new(move || {
        Box::new(
            RunCommand::new(
                "shooter_speed_test",
                ResourceSet::of(&[shooter]),
                move |ctx| {
                    ctx.outputs
                        .unit_mut(shooter)
                        .set_motor(subsystems::FLYWHEEL, demand);
                },
            )
            .with_end(move |ctx| {
                ctx.outputs
                    .unit_mut(shooter)
                    .set_motor(subsystems::FLYWHEEL, 0.0);
            }),
        )
    })
}

/// Open-loop twist toward the goal.
pub fn vision_align(subs: Subsystems) -> CommandFactory {
    let drive = subs.drive;
    Box::new(move || {
        Box::new(
            TimedCommand::new(
                "vision_align",
                ResourceSet::of(&[drive]),
                ALIGN_CYCLES,
                move |ctx| {
                    let unit = ctx.outputs.unit_mut(drive);
                    unit.set_motor(subsystems::DRIVE_LEFT, ALIGN_POWER);
                    unit.set_motor(subsystems::DRIVE_RIGHT, -ALIGN_POWER);
                },
            )
            .with_end(move |ctx| {
                let unit = ctx.outputs.unit_mut(drive);
                unit.set_motor(subsystems::DRIVE_LEFT, 0.0);
                unit.set_motor(subsystems::DRIVE_RIGHT, 0.0);
            }),
        )
    })
}

// ─── Shoot sequence ─────────────────────────────────────────────────

/// Full shot: spin the flywheel up, then hold speed while the magazine
/// feeds. Claims the shooter and magazine for the whole sequence.
pub fn shoot_sequence(
    subs: Subsystems,
    shooter_cfg: ShooterConfig,
    feed_power: f64,
) -> CommandFactory {
    let shooter = subs.shooter;
    let magazine = subs.magazine;
    Box::new(move || {
        let spin_up = TimedCommand::new(
            "spin_up",
            ResourceSet::of(&[shooter]),
            shooter_cfg.spin_up_cycles,
            move |ctx| {
                ctx.outputs
                    .unit_mut(shooter)
                    .set_motor(subsystems::FLYWHEEL, 1.0);
            },
        );
        let hold = TimedCommand::new(
            "hold_flywheel",
            ResourceSet::of(&[shooter]),
            shooter_cfg.feed_cycles,
            move |ctx| {
                ctx.outputs
                    .unit_mut(shooter)
                    .set_motor(subsystems::FLYWHEEL, 1.0);
            },
        )
        .with_end(move |ctx| {
            ctx.outputs
                .unit_mut(shooter)
                .set_motor(subsystems::FLYWHEEL, 0.0);
        });
        let feed = TimedCommand::new(
            "feed",
            ResourceSet::of(&[magazine]),
            shooter_cfg.feed_cycles,
            move |ctx| {
                ctx.outputs
                    .unit_mut(magazine)
                    .set_motor(subsystems::MAGAZINE_BELT, feed_power);
            },
        )
        .with_end(move |ctx| {
            ctx.outputs
                .unit_mut(magazine)
                .set_motor(subsystems::MAGAZINE_BELT, 0.0);
        });

        // Flywheel and feed claim disjoint resources, so the group always builds.
        let fire = ParallelGroup::new(
            "fire",
            ParallelMode::AllFinish,
            vec![Box::new(hold), Box::new(feed)],
        )
        .unwrap();
        Box::new(SequentialGroup::new(
            "shoot",
            vec![Box::new(spin_up), Box::new(fire)],
        ))
    })
}

// ─── Autonomous ─────────────────────────────────────────────────────

/// Drives forward long enough to clear the starting line.
pub fn cross_line(subs: Subsystems) -> CommandFactory {
    let drive = subs.drive;
    Box::new(move || {
        Box::new(
            TimedCommand::new(
                "cross_line",
                ResourceSet::of(&[drive]),
                CROSS_LINE_CYCLES,
                move |ctx| {
                    let unit = ctx.outputs.unit_mut(drive);
                    unit.set_motor(subsystems::DRIVE_LEFT, CROSS_LINE_POWER);
                    unit.set_motor(subsystems::DRIVE_RIGHT, CROSS_LINE_POWER);
                },
            )
            .with_end(move |ctx| {
                let unit = ctx.outputs.unit_mut(drive);
                unit.set_motor(subsystems::DRIVE_LEFT, 0.0);
                unit.set_motor(subsystems::DRIVE_RIGHT, 0.0);
            }),
        )
    })
}

/// Builds the autonomous chooser and pre-selects the configured routine.
pub fn build_chooser(subs: Subsystems, config: &RobotConfig) -> Result<AutoChooser, ChooserError> {
    let mut chooser = AutoChooser::new();
    chooser.add_option(
        "none",
        Box::new(|| Box::new(InstantCommand::new("auto_idle", ResourceSet::EMPTY, |_ctx| {}))),
    )?;
    chooser.add_option("cross_line", cross_line(subs))?;

    let shoot = shoot_sequence(subs, config.shooter, config.powers.magazine);
    let cross = cross_line(subs);
    chooser.add_option(
        "shoot_and_cross",
        Box::new(move || Box::new(SequentialGroup::new("shoot_and_cross", vec![shoot(), cross()]))),
    )?;

    chooser.set_default(&config.autonomous)?;
    Ok(chooser)
}
