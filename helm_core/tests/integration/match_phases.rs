//! Match phase scenarios: disabled to autonomous to teleop to disabled,
//! with the chooser picking the routine, defaults backfilling in every
//! enabled phase, and trigger edge history surviving phase changes.

use helm_common::input::{
    AxisId, ButtonId, GamepadAxis, GamepadButton, InputFrame, InputSource, PadState,
};
use helm_core::auto::AutoChooser;
use helm_core::binding::{BindAction, BindingTable};
use helm_core::command::func::{RunCommand, TimedCommand};
use helm_core::cycle::CycleRunner;
use helm_core::phase::{PhaseEvent, PhaseTransition, RobotPhase};
use helm_core::resource::{ResourceSet, ResourceTable};
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

// ── Tests ──

#[test]
fn full_match_sequence() {
    let a = [GamepadButton::A];
    let frames = vec![
        frame(&a, 0.3),  // disabled, button mashed early
        frame(&[], 0.3), // disabled
        frame(&[], 0.3), // auto: routine promotes
        frame(&a, 0.3),  // auto: routine drives, button held from here
        frame(&a, 0.3),
        frame(&a, 0.3),
        frame(&a, 0.3), // auto: routine swept, default backfills
        frame(&a, 0.3), // auto: default drives
        frame(&a, 0.3), // teleop: held button must not fire
        frame(&[], 0.3),
        frame(&a, 0.3), // teleop: fresh press fires
        frame(&a, 0.3),
    ];

    let mut table = ResourceTable::new();
    let drive = table.register("drive").unwrap();
    let intake = table.register("intake").unwrap();
    table
        .set_default(
            drive,
            Box::new(move || {
                Box::new(RunCommand::new(
                    "arcade_drive",
                    ResourceSet::of(&[drive]),
                    move |ctx| {
                        let y = ctx.input.analog(AxisId::new(0, GamepadAxis::LeftY));
                        ctx.outputs.unit_mut(drive).set_motor(0, y);
                    },
                ))
            }),
        )
        .unwrap();
    let scheduler = Scheduler::new(table);

    let mut bindings = BindingTable::new();
    let a_trig = bindings.add_trigger(Trigger::button("pad0_a", ButtonId::new(0, GamepadButton::A)));
    let roller = bindings
        .register_command(
            "run_intake",
            Box::new(move || {
                Box::new(
                    RunCommand::new("run_intake", ResourceSet::of(&[intake]), move |ctx| {
                        ctx.outputs.unit_mut(intake).set_motor(0, 1.0)
                    })
                    .with_end(move |ctx| ctx.outputs.unit_mut(intake).set_motor(0, 0.0)),
                )
            }),
            scheduler.resources(),
        )
        .unwrap();
    bindings.bind(a_trig, BindAction::WhileHeld, roller).unwrap();

    let mut chooser = AutoChooser::new();
    chooser
        .add_option(
            "cross_line",
            Box::new(move || {
                Box::new(
                    TimedCommand::new("cross_line", ResourceSet::of(&[drive]), 3, move |ctx| {
                        ctx.outputs.unit_mut(drive).set_motor(0, 0.4)
                    })
                    .with_end(move |ctx| ctx.outputs.unit_mut(drive).set_motor(0, 0.0)),
                )
            }),
        )
        .unwrap();
    chooser.set_default("cross_line").unwrap();

    let mut runner = CycleRunner::new(SequenceInput::new(frames), scheduler, bindings, chooser);

    // Disabled: mashed buttons do nothing.
    runner.step();
    runner.step();
    assert_eq!(runner.scheduler().active_count(), 0);

    runner.request_phase(PhaseEvent::StartAutonomous);
    assert_eq!(runner.phase(), RobotPhase::Autonomous);
    assert_eq!(runner.scheduler().active_names(), vec!["cross_line"]);

    runner.step(); // promote
    runner.step(); // routine drives; held button is ignored outside teleop
    assert_eq!(runner.outputs().unit(drive).motor(0), 0.4);
    assert_eq!(runner.scheduler().active_count(), 1);
    assert_eq!(runner.outputs().unit(intake).motor(0), 0.0);

    runner.step();
    runner.step(); // routine finishes its count
    runner.step(); // swept; drive released; default backfills
    assert_eq!(runner.outputs().unit(drive).motor(0), 0.0);
    assert_eq!(runner.scheduler().active_names(), vec!["arcade_drive"]);

    runner.step(); // default follows the stick while still in autonomous
    assert_eq!(runner.outputs().unit(drive).motor(0), 0.3);

    runner.request_phase(PhaseEvent::StartTeleop);
    assert_eq!(runner.phase(), RobotPhase::Teleop);
    assert_eq!(runner.scheduler().active_count(), 1);

    runner.step(); // button held since autonomous: steady high, no schedule
    assert_eq!(runner.scheduler().active_names(), vec!["arcade_drive"]);

    runner.step(); // release
    runner.step(); // fresh press schedules the roller
    assert_eq!(runner.scheduler().active_count(), 2);

    runner.step();
    assert_eq!(runner.outputs().unit(intake).motor(0), 1.0);

    runner.request_phase(PhaseEvent::Disable);
    assert_eq!(runner.phase(), RobotPhase::Disabled);
    assert_eq!(runner.scheduler().active_count(), 0);
    assert_eq!(runner.outputs().unit(drive).motor(0), 0.0);
    assert_eq!(runner.outputs().unit(intake).motor(0), 0.0);
}

#[test]
fn autonomous_cannot_start_from_teleop() {
    let mut table = ResourceTable::new();
    let drive = table.register("drive").unwrap();
    table
        .set_default(
            drive,
            Box::new(move || {
                Box::new(RunCommand::new(
                    "hold_position",
                    ResourceSet::of(&[drive]),
                    |_| {},
                ))
            }),
        )
        .unwrap();

    let mut runner = CycleRunner::new(
        SequenceInput::new(vec![]),
        Scheduler::new(table),
        BindingTable::new(),
        AutoChooser::new(),
    );
    runner.request_phase(PhaseEvent::StartTeleop);
    runner.step();
    let holder = runner.scheduler().holder_of(drive);
    assert!(holder.is_some());

    let transition = runner.request_phase(PhaseEvent::StartAutonomous);
    assert!(matches!(transition, PhaseTransition::Rejected(_)));
    assert_eq!(runner.phase(), RobotPhase::Teleop);

    // The rejected request touched nothing.
    runner.step();
    assert_eq!(runner.scheduler().holder_of(drive), holder);
}

#[test]
fn chooser_selection_overrides_default_option() {
    let mut table = ResourceTable::new();
    let drive = table.register("drive").unwrap();
    let scheduler = Scheduler::new(table);

    let mut chooser = AutoChooser::new();
    chooser
        .add_option(
            "cross_line",
            Box::new(move || {
                Box::new(RunCommand::new(
                    "cross_line",
                    ResourceSet::of(&[drive]),
                    |_| {},
                ))
            }),
        )
        .unwrap();
    chooser
        .add_option(
            "two_ball",
            Box::new(move || {
                Box::new(RunCommand::new(
                    "two_ball",
                    ResourceSet::of(&[drive]),
                    |_| {},
                ))
            }),
        )
        .unwrap();
    chooser.set_default("cross_line").unwrap();

    let mut runner = CycleRunner::new(
        SequenceInput::new(vec![]),
        scheduler,
        BindingTable::new(),
        chooser,
    );
    runner.chooser_mut().select("two_ball").unwrap();

    runner.request_phase(PhaseEvent::StartAutonomous);
    assert_eq!(runner.scheduler().active_names(), vec!["two_ball"]);
}

#[test]
fn reenable_after_disable_schedules_fresh_instances() {
    let a = [GamepadButton::A];
    let frames = vec![
        frame(&[], 0.0),
        frame(&a, 0.0),
        frame(&a, 0.0),
        frame(&a, 0.0), // re-enabled mid-hold
        frame(&[], 0.0),
        frame(&a, 0.0),
        frame(&a, 0.0),
    ];

    let mut table = ResourceTable::new();
    let intake = table.register("intake").unwrap();
    let scheduler = Scheduler::new(table);

    let mut bindings = BindingTable::new();
    let a_trig = bindings.add_trigger(Trigger::button("pad0_a", ButtonId::new(0, GamepadButton::A)));
    let roller = bindings
        .register_command(
            "run_intake",
            Box::new(move || {
                Box::new(
                    RunCommand::new("run_intake", ResourceSet::of(&[intake]), move |ctx| {
                        ctx.outputs.unit_mut(intake).set_motor(0, 1.0)
                    })
                    .with_end(move |ctx| ctx.outputs.unit_mut(intake).set_motor(0, 0.0)),
                )
            }),
            scheduler.resources(),
        )
        .unwrap();
    bindings.bind(a_trig, BindAction::WhileHeld, roller).unwrap();

    let mut runner = CycleRunner::new(
        SequenceInput::new(frames),
        scheduler,
        bindings,
        AutoChooser::new(),
    );
    runner.request_phase(PhaseEvent::StartTeleop);

    runner.step(); // idle
    runner.step(); // press schedules the first instance
    let first = runner.scheduler().holder_of(intake).unwrap();
    runner.step();
    assert_eq!(runner.outputs().unit(intake).motor(0), 1.0);

    runner.request_phase(PhaseEvent::Disable);
    assert_eq!(runner.scheduler().active_count(), 0);
    assert_eq!(runner.outputs().unit(intake).motor(0), 0.0);

    runner.request_phase(PhaseEvent::StartTeleop);

    runner.step(); // button held across the disable: no rising edge, no schedule
    assert_eq!(runner.scheduler().active_count(), 0);

    runner.step(); // release: the stale live id cancels as a harmless no-op
    assert_eq!(runner.scheduler().active_count(), 0);

    runner.step(); // fresh press mints a fresh instance
    let second = runner.scheduler().holder_of(intake).unwrap();
    assert_ne!(second, first);

    runner.step();
    assert_eq!(runner.outputs().unit(intake).motor(0), 1.0);
}
