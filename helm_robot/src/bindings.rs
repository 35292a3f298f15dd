//! The operator binding map: which edge on which pad drives which command.
//!
//! Built once at startup. Every trigger, slot, and resource reference is
//! validated during construction, so a typo here aborts the boot instead
//! of leaving a dead button on the field.

use helm_common::input::{AxisId, ButtonId, DpadDirection, GamepadAxis, GamepadButton};
use helm_core::binding::{BindAction, BindingError, BindingTable};
use helm_core::resource::ResourceTable;
use helm_core::trigger::Trigger;

use crate::commands;
use crate::config::RobotConfig;
use crate::subsystems::Subsystems;

/// Left-trigger pull depth that counts as a winch request.
const WINCH_PULL_THRESHOLD: f64 = 0.5;

/// Builds the complete binding table for both pads.
pub fn build(
    subs: Subsystems,
    config: &RobotConfig,
    resources: &ResourceTable,
) -> Result<BindingTable, BindingError> {
    let driver = config.controllers.driver_port;
    let operator = config.controllers.operator_port;
    let powers = &config.powers;
    let mut table = BindingTable::new();

    // ─── Operator pad ───────────────────────────────────────────────

    let a = table.add_trigger(Trigger::button(
        "operator_a",
        ButtonId::new(operator, GamepadButton::A),
    ));
    let slot = table.register_command(
        "intake_in",
        commands::intake_in(subs, powers.intake),
        resources,
    )?;
    table.bind(a, BindAction::WhileHeld, slot)?;

    let back = table.add_trigger(Trigger::button(
        "operator_back",
        ButtonId::new(operator, GamepadButton::Back),
    ));
    let slot = table.register_command(
        "intake_out",
        commands::intake_out(subs, powers.intake),
        resources,
    )?;
    table.bind(back, BindAction::WhileHeld, slot)?;

    let x = table.add_trigger(Trigger::button(
        "operator_x",
        ButtonId::new(operator, GamepadButton::X),
    ));
    let slot = table.register_command(
        "intake_joint_toggle",
        commands::intake_joint_toggle(subs),
        resources,
    )?;
    table.bind(x, BindAction::SchedulePress, slot)?;

    let y = table.add_trigger(Trigger::button(
        "operator_y",
        ButtonId::new(operator, GamepadButton::Y),
    ));
    let slot = table.register_command(
        "compressor_toggle",
        commands::compressor_toggle(subs),
        resources,
    )?;
    table.bind(y, BindAction::SchedulePress, slot)?;

    let b = table.add_trigger(Trigger::button(
        "operator_b",
        ButtonId::new(operator, GamepadButton::B),
    ));
    let slot = table.register_command(
        "shoot",
        commands::shoot_sequence(subs, config.shooter, powers.magazine),
        resources,
    )?;
    table.bind(b, BindAction::SchedulePress, slot)?;

    let dpad_up = table.add_trigger(Trigger::dpad(
        "operator_dpad_up",
        operator,
        DpadDirection::Up,
    ));
    let slot = table.register_command("spinner_raise", commands::spinner_raise(subs), resources)?;
    table.bind(dpad_up, BindAction::SchedulePress, slot)?;

    let dpad_down = table.add_trigger(Trigger::dpad(
        "operator_dpad_down",
        operator,
        DpadDirection::Down,
    ));
    let slot = table.register_command("spinner_lower", commands::spinner_lower(subs), resources)?;
    table.bind(dpad_down, BindAction::SchedulePress, slot)?;

    let dpad_left = table.add_trigger(Trigger::dpad(
        "operator_dpad_left",
        operator,
        DpadDirection::Left,
    ));
    let slot = table.register_command("stop_shooter", commands::stop_shooter(subs), resources)?;
    table.bind(dpad_left, BindAction::SchedulePress, slot)?;

    let dpad_right = table.add_trigger(Trigger::dpad(
        "operator_dpad_right",
        operator,
        DpadDirection::Right,
    ));
    let slot = table.register_command(
        "shooter_speed_test",
        commands::shooter_speed_test(subs, config.shooter),
        resources,
    )?;
    table.bind(dpad_right, BindAction::WhileHeld, slot)?;

    let lb = table.add_trigger(Trigger::button(
        "operator_lb",
        ButtonId::new(operator, GamepadButton::LeftBumper),
    ));
    let slot = table.register_command("mast_up", commands::mast_up(subs, powers.mast), resources)?;
    table.bind(lb, BindAction::WhileHeld, slot)?;

    let rb = table.add_trigger(Trigger::button(
        "operator_rb",
        ButtonId::new(operator, GamepadButton::RightBumper),
    ));
    let slot = table.register_command(
        "magazine_feed",
        commands::magazine_feed(subs, powers.magazine),
        resources,
    )?;
    table.bind(rb, BindAction::WhileHeld, slot)?;

    let lt = table.add_trigger(Trigger::axis_above(
        "operator_lt_pull",
        AxisId::new(operator, GamepadAxis::LeftTrigger),
        WINCH_PULL_THRESHOLD,
    ));
    let slot = table.register_command(
        "winch_retract",
        commands::winch_retract(subs, powers.winch),
        resources,
    )?;
    table.bind(lt, BindAction::WhileHeld, slot)?;

    // ─── Driver pad ─────────────────────────────────────────────────

    let driver_x = table.add_trigger(Trigger::button(
        "driver_x",
        ButtonId::new(driver, GamepadButton::X),
    ));
    let slot = table.register_command("gearbox_toggle", commands::gearbox_toggle(subs), resources)?;
    table.bind(driver_x, BindAction::SchedulePress, slot)?;

    let driver_b = table.add_trigger(Trigger::button(
        "driver_b",
        ButtonId::new(driver, GamepadButton::B),
    ));
    let slot = table.register_command("vision_align", commands::vision_align(subs), resources)?;
    table.bind(driver_b, BindAction::SchedulePress, slot)?;

    Ok(table)
}
