//! Teleop flow scenarios: a drive default that follows the stick, a
//! while-held magazine roller, and a spin-up-then-fire volley group, all
//! driven end to end through the cycle runner by scripted operator frames.

use helm_common::input::{
    AxisId, ButtonId, GamepadAxis, GamepadButton, InputFrame, InputSource, PadState,
};
use helm_core::auto::AutoChooser;
use helm_core::binding::{BindAction, BindingTable};
use helm_core::command::CommandState;
use helm_core::command::func::{RunCommand, TimedCommand};
use helm_core::command::group::{ParallelGroup, ParallelMode, SequentialGroup};
use helm_core::cycle::CycleRunner;
use helm_core::phase::PhaseEvent;
use helm_core::resource::{ResourceId, ResourceSet, ResourceTable};
use helm_core::scheduler::Scheduler;
use helm_core::trigger::Trigger;

// ── Helpers ──

/// Plays back a fixed frame script, then reads all-inactive.
struct SequenceInput {
    frames: Vec<InputFrame>,
    current: InputFrame,
    cursor: usize,
}

impl SequenceInput {
    fn new(frames: Vec<InputFrame>) -> Self {
        Self {
            frames,
            current: InputFrame::default(),
            cursor: 0,
        }
    }
}

impl InputSource for SequenceInput {
    fn begin_cycle(&mut self, _cycle: u64) {
        self.current = self.frames.get(self.cursor).copied().unwrap_or_default();
        if self.cursor < self.frames.len() {
            self.cursor += 1;
        }
    }
    fn sample(&mut self, port: u8) -> PadState {
        self.current.pad(port)
    }
}

/// One operator frame on pad 0: pressed buttons plus a left-stick Y value.
fn frame(buttons: &[GamepadButton], left_y: f64) -> InputFrame {
    let mut pad = PadState::default();
    for &button in buttons {
        pad.press(button);
    }
    pad.set_axis(GamepadAxis::LeftY, left_y);
    let mut frame = InputFrame::default();
    frame.set_pad(0, pad);
    frame
}

struct Rig {
    drive: ResourceId,
    shooter: ResourceId,
    magazine: ResourceId,
}

/// Three-subsystem robot: arcade default on the drive, while-held magazine
/// roller on button A, a spin-up-then-fire volley group on button B.
fn shooting_robot(frames: Vec<InputFrame>) -> (CycleRunner<SequenceInput>, Rig) {
    let mut table = ResourceTable::new();
    let drive = table.register("drive").unwrap();
    let shooter = table.register("shooter").unwrap();
    let magazine = table.register("magazine").unwrap();

    table
        .set_default(
            drive,
            Box::new(move || {
                Box::new(RunCommand::new(
                    "arcade_drive",
                    ResourceSet::of(&[drive]),
                    move |ctx| {
                        let y = ctx.input.analog(AxisId::new(0, GamepadAxis::LeftY));
                        let x = ctx.input.analog(AxisId::new(0, GamepadAxis::RightX));
                        let unit = ctx.outputs.unit_mut(drive);
                        unit.set_motor(0, y + x);
                        unit.set_motor(1, y - x);
                    },
                ))
            }),
        )
        .unwrap();

    let scheduler = Scheduler::new(table);

    let mut bindings = BindingTable::new();
    let a = bindings.add_trigger(Trigger::button("pad0_a", ButtonId::new(0, GamepadButton::A)));
    let b = bindings.add_trigger(Trigger::button("pad0_b", ButtonId::new(0, GamepadButton::B)));

    let roller = bindings
        .register_command(
            "run_magazine",
            Box::new(move || {
                Box::new(
                    RunCommand::new(
                        "run_magazine",
                        ResourceSet::of(&[magazine]),
                        move |ctx| ctx.outputs.unit_mut(magazine).set_motor(0, 1.0),
                    )
                    .with_end(move |ctx| ctx.outputs.unit_mut(magazine).set_motor(0, 0.0)),
                )
            }),
            scheduler.resources(),
        )
        .unwrap();
    bindings.bind(a, BindAction::WhileHeld, roller).unwrap();

    let volley = bindings
        .register_command(
            "volley",
            Box::new(move || {
                let spin_up = TimedCommand::new(
                    "spin_up",
                    ResourceSet::of(&[shooter]),
                    2,
                    move |ctx| ctx.outputs.unit_mut(shooter).set_motor(0, 0.6),
                );
                let hold = TimedCommand::new(
                    "hold_flywheel",
                    ResourceSet::of(&[shooter]),
                    2,
                    move |ctx| ctx.outputs.unit_mut(shooter).set_motor(0, 0.6),
                )
                .with_end(move |ctx| ctx.outputs.unit_mut(shooter).set_motor(0, 0.0));
                let feed = TimedCommand::new(
                    "feed",
                    ResourceSet::of(&[magazine]),
                    2,
                    move |ctx| ctx.outputs.unit_mut(magazine).set_motor(0, 1.0),
                )
                .with_end(move |ctx| ctx.outputs.unit_mut(magazine).set_motor(0, 0.0));
                let fire = ParallelGroup::new(
                    "fire",
                    ParallelMode::AllFinish,
                    vec![Box::new(hold), Box::new(feed)],
                )
                .unwrap();
                Box::new(SequentialGroup::new(
                    "volley",
                    vec![Box::new(spin_up), Box::new(fire)],
                ))
            }),
            scheduler.resources(),
        )
        .unwrap();
    bindings.bind(b, BindAction::SchedulePress, volley).unwrap();

    let mut runner = CycleRunner::new(
        SequenceInput::new(frames),
        scheduler,
        bindings,
        AutoChooser::new(),
    );
    runner.request_phase(PhaseEvent::StartTeleop);
    (
        runner,
        Rig {
            drive,
            shooter,
            magazine,
        },
    )
}

// ── Tests ──

#[test]
fn default_drive_backfills_and_follows_stick() {
    let frames = vec![frame(&[], 0.3), frame(&[], 0.3), frame(&[], -0.5)];
    let (mut runner, rig) = shooting_robot(frames);

    runner.step(); // backfill schedules the default, initialize only
    assert_eq!(runner.scheduler().active_names(), vec!["arcade_drive"]);
    assert_eq!(runner.outputs().unit(rig.drive).motor(0), 0.0);

    runner.step(); // first execute reads the stick
    assert_eq!(runner.outputs().unit(rig.drive).motor(0), 0.3);
    assert_eq!(runner.outputs().unit(rig.drive).motor(1), 0.3);

    runner.step(); // default keeps following live input
    assert_eq!(runner.outputs().unit(rig.drive).motor(0), -0.5);
}

#[test]
fn while_held_magazine_runs_between_press_and_release() {
    let a = [GamepadButton::A];
    let frames = vec![
        frame(&[], 0.0),
        frame(&a, 0.0),
        frame(&a, 0.0),
        frame(&a, 0.0),
        frame(&[], 0.0),
    ];
    let (mut runner, rig) = shooting_robot(frames);

    runner.step(); // idle: only the drive default backfills
    assert_eq!(runner.scheduler().active_count(), 1);

    runner.step(); // rising edge schedules, initialize only
    assert_eq!(runner.scheduler().active_count(), 2);
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 0.0);

    runner.step(); // held: the roller runs
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 1.0);
    runner.step();
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 1.0);

    runner.step(); // falling edge cancels and the end hook stops the roller
    assert_eq!(runner.scheduler().active_count(), 1);
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 0.0);
    assert_eq!(runner.scheduler().holder_of(rig.magazine), None);
}

#[test]
fn volley_group_spins_up_then_fires_and_releases() {
    let b = [GamepadButton::B];
    let mut frames = vec![frame(&[], 0.0), frame(&b, 0.0)];
    frames.extend(vec![frame(&[], 0.0); 5]);
    let (mut runner, rig) = shooting_robot(frames);

    runner.step(); // drive default backfills

    runner.step(); // press: the whole group claims shooter and magazine
    let volley_id = runner.scheduler().holder_of(rig.shooter).unwrap();
    assert_eq!(runner.scheduler().holder_of(rig.magazine), Some(volley_id));
    assert_ne!(runner.scheduler().holder_of(rig.drive), Some(volley_id));
    assert_eq!(runner.scheduler().active_count(), 2);

    runner.step(); // spin_up runs alone
    assert_eq!(runner.outputs().unit(rig.shooter).motor(0), 0.6);
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 0.0);

    runner.step(); // spin_up finishes; fire initializes in the same cycle
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 0.0);

    runner.step(); // parallel children run side by side
    assert_eq!(runner.outputs().unit(rig.shooter).motor(0), 0.6);
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 1.0);

    runner.step(); // both children finish; end hooks stop the motors
    assert_eq!(runner.outputs().unit(rig.shooter).motor(0), 0.0);
    assert_eq!(runner.outputs().unit(rig.magazine).motor(0), 0.0);

    runner.step(); // completion sweep releases the group
    assert_eq!(runner.scheduler().active_names(), vec!["arcade_drive"]);
    assert_eq!(runner.scheduler().holder_of(rig.shooter), None);
    assert_eq!(runner.scheduler().holder_of(rig.magazine), None);
    assert_eq!(runner.scheduler().state_of(volley_id), CommandState::Finished);
}
