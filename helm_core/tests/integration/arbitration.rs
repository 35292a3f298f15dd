//! Resource arbitration scenarios: non-interruptible holders, all-or-nothing
//! multi-resource requests, and the default command yielding to and
//! returning after an interrupting command.

use helm_common::input::{
    AxisId, ButtonId, GamepadAxis, GamepadButton, InputFrame, InputSource, PadState,
};
use helm_common::output::ActuatorBank;
use helm_core::auto::AutoChooser;
use helm_core::binding::{BindAction, BindingTable};
use helm_core::command::func::{RunCommand, TimedCommand};
use helm_core::command::group::SequentialGroup;
use helm_core::command::{Command, CommandState, CycleCtx, InterruptPolicy, StepResult};
use helm_core::cycle::CycleRunner;
use helm_core::phase::PhaseEvent;
use helm_core::resource::{ResourceSet, ResourceTable};
use helm_core::scheduler::{RejectReason, ScheduleOutcome, Scheduler};
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

/// Does nothing each cycle, never finishes; used to pin resources.
struct Claim {
    name: &'static str,
    requirements: ResourceSet,
    policy: InterruptPolicy,
}

impl Claim {
    fn interruptible(name: &'static str, requirements: ResourceSet) -> Box<dyn Command> {
        Box::new(Self {
            name,
            requirements,
            policy: InterruptPolicy::Interruptible,
        })
    }

    fn non_interruptible(name: &'static str, requirements: ResourceSet) -> Box<dyn Command> {
        Box::new(Self {
            name,
            requirements,
            policy: InterruptPolicy::NonInterruptible,
        })
    }
}

impl Command for Claim {
    fn name(&self) -> &str {
        self.name
    }
    fn requirements(&self) -> ResourceSet {
        self.requirements
    }
    fn interrupt_policy(&self) -> InterruptPolicy {
        self.policy
    }
    fn execute(&mut self, _ctx: &mut CycleCtx<'_>) -> StepResult {
        Ok(())
    }
}

// ── Tests ──

#[test]
fn multi_resource_request_is_all_or_nothing() {
    let mut table = ResourceTable::new();
    let drive = table.register("drive").unwrap();
    let shooter = table.register("shooter").unwrap();
    let magazine = table.register("magazine").unwrap();
    let mut sched = Scheduler::new(table);

    let blank = InputFrame::default();
    let mut bank = ActuatorBank::new();
    let mut ctx = CycleCtx {
        cycle: 0,
        input: &blank,
        outputs: &mut bank,
    };

    let guard_id = sched
        .schedule(
            Claim::non_interruptible("hold_shooter", ResourceSet::of(&[shooter])),
            &mut ctx,
        )
        .id()
        .unwrap();

    let wants_all = ResourceSet::of(&[drive, shooter, magazine]);
    match sched.schedule(Claim::interruptible("full_volley", wants_all), &mut ctx) {
        ScheduleOutcome::Rejected(RejectReason::NonInterruptibleHolder { holder }) => {
            assert_eq!(holder, guard_id);
        }
        other => panic!("expected a non-interruptible rejection, got {other:?}"),
    }

    // Nothing changed hands on the way to the rejection.
    assert_eq!(sched.holder_of(drive), None);
    assert_eq!(sched.holder_of(magazine), None);
    assert_eq!(sched.holder_of(shooter), Some(guard_id));
    assert_eq!(sched.active_count(), 1);

    // Once the holder is gone, the identical request succeeds atomically.
    assert!(sched.cancel(guard_id, &mut ctx));
    let volley_id = sched
        .schedule(Claim::interruptible("full_volley", wants_all), &mut ctx)
        .id()
        .unwrap();
    for resource in [drive, shooter, magazine] {
        assert_eq!(sched.holder_of(resource), Some(volley_id));
    }
}

#[test]
fn interrupting_command_takes_over_every_holder() {
    let mut table = ResourceTable::new();
    let drive = table.register("drive").unwrap();
    let shooter = table.register("shooter").unwrap();
    let mut sched = Scheduler::new(table);

    let blank = InputFrame::default();
    let mut bank = ActuatorBank::new();
    let mut ctx = CycleCtx {
        cycle: 0,
        input: &blank,
        outputs: &mut bank,
    };

    let a_id = sched
        .schedule(
            Claim::interruptible("hold_drive", ResourceSet::of(&[drive])),
            &mut ctx,
        )
        .id()
        .unwrap();
    let b_id = sched
        .schedule(
            Claim::interruptible("hold_shooter", ResourceSet::of(&[shooter])),
            &mut ctx,
        )
        .id()
        .unwrap();

    let c_id = sched
        .schedule(
            Claim::interruptible("take_both", ResourceSet::of(&[drive, shooter])),
            &mut ctx,
        )
        .id()
        .unwrap();

    assert_eq!(sched.state_of(a_id), CommandState::Finished);
    assert_eq!(sched.state_of(b_id), CommandState::Finished);
    assert_eq!(sched.holder_of(drive), Some(c_id));
    assert_eq!(sched.holder_of(shooter), Some(c_id));
    assert_eq!(sched.active_names(), vec!["take_both"]);
}

#[test]
fn group_schedule_is_refused_while_a_member_resource_is_guarded() {
    let mut table = ResourceTable::new();
    let shooter = table.register("shooter").unwrap();
    let magazine = table.register("magazine").unwrap();
    let mut sched = Scheduler::new(table);

    let blank = InputFrame::default();
    let mut bank = ActuatorBank::new();
    let mut ctx = CycleCtx {
        cycle: 0,
        input: &blank,
        outputs: &mut bank,
    };

    let guard_id = sched
        .schedule(
            Claim::non_interruptible("jam_clear", ResourceSet::of(&[magazine])),
            &mut ctx,
        )
        .id()
        .unwrap();

    // The group claims the union of its children up front, so a guarded
    // magazine refuses the whole sequence even though spin_up only needs
    // the shooter.
    let volley = |shooter, magazine| -> Box<dyn Command> {
        let spin_up = TimedCommand::new("spin_up", ResourceSet::of(&[shooter]), 2, |_| {});
        let feed = TimedCommand::new("feed", ResourceSet::of(&[magazine]), 2, |_| {});
        Box::new(SequentialGroup::new(
            "volley",
            vec![Box::new(spin_up), Box::new(feed)],
        ))
    };

    assert!(!sched.schedule(volley(shooter, magazine), &mut ctx).is_scheduled());
    assert_eq!(sched.holder_of(shooter), None);
    assert_eq!(sched.active_names(), vec!["jam_clear"]);

    assert!(sched.cancel(guard_id, &mut ctx));
    assert!(sched.schedule(volley(shooter, magazine), &mut ctx).is_scheduled());
}

#[test]
fn non_interruptible_winch_holds_until_released() {
    let x = [GamepadButton::X];
    let xy = [GamepadButton::X, GamepadButton::Y];
    let y = [GamepadButton::Y];
    let frames = vec![
        frame(&[], 0.0),
        frame(&x, 0.0),
        frame(&xy, 0.0),
        frame(&x, 0.0),
        frame(&[], 0.0),
        frame(&y, 0.0),
        frame(&y, 0.0),
    ];

    let mut table = ResourceTable::new();
    let winch = table.register("winch").unwrap();
    let scheduler = Scheduler::new(table);

    let mut bindings = BindingTable::new();
    let hold_trig =
        bindings.add_trigger(Trigger::button("pad0_x", ButtonId::new(0, GamepadButton::X)));
    let jog_trig =
        bindings.add_trigger(Trigger::button("pad0_y", ButtonId::new(0, GamepadButton::Y)));

    let hold = bindings
        .register_command(
            "hold_winch",
            Box::new(move || {
                Box::new(
                    RunCommand::new("hold_winch", ResourceSet::of(&[winch]), move |ctx| {
                        ctx.outputs.unit_mut(winch).set_motor(0, 1.0)
                    })
                    .with_end(move |ctx| ctx.outputs.unit_mut(winch).set_motor(0, 0.0))
                    .non_interruptible(),
                )
            }),
            scheduler.resources(),
        )
        .unwrap();
    let jog = bindings
        .register_command(
            "jog_winch",
            Box::new(move || {
                Box::new(RunCommand::new(
                    "jog_winch",
                    ResourceSet::of(&[winch]),
                    move |ctx| ctx.outputs.unit_mut(winch).set_motor(0, -0.3),
                ))
            }),
            scheduler.resources(),
        )
        .unwrap();
    bindings.bind(hold_trig, BindAction::WhileHeld, hold).unwrap();
    bindings.bind(jog_trig, BindAction::SchedulePress, jog).unwrap();

    let mut runner = CycleRunner::new(
        SequenceInput::new(frames),
        scheduler,
        bindings,
        AutoChooser::new(),
    );
    runner.request_phase(PhaseEvent::StartTeleop);

    runner.step(); // idle
    assert_eq!(runner.scheduler().active_count(), 0);

    runner.step(); // X press schedules the hold
    let hold_id = runner.scheduler().holder_of(winch).unwrap();

    runner.step(); // Y press while held: jog is rejected, hold keeps running
    assert_eq!(runner.scheduler().active_names(), vec!["hold_winch"]);
    assert_eq!(runner.scheduler().holder_of(winch), Some(hold_id));
    assert_eq!(runner.outputs().unit(winch).motor(0), 1.0);

    runner.step(); // still held
    assert_eq!(runner.outputs().unit(winch).motor(0), 1.0);

    runner.step(); // X release: an explicit cancel ends even a non-interruptible
    assert_eq!(runner.scheduler().active_count(), 0);
    assert_eq!(runner.outputs().unit(winch).motor(0), 0.0);

    runner.step(); // Y press now lands on a free winch
    assert_eq!(runner.scheduler().active_names(), vec!["jog_winch"]);

    runner.step();
    assert_eq!(runner.outputs().unit(winch).motor(0), -0.3);
}

#[test]
fn default_returns_after_interrupting_command_finishes() {
    let b = [GamepadButton::B];
    let frames = vec![
        frame(&[], 0.3),
        frame(&[], 0.3),
        frame(&b, 0.3),
        frame(&[], 0.3),
        frame(&[], 0.3),
        frame(&[], 0.3),
        frame(&[], 0.3),
    ];

    let mut table = ResourceTable::new();
    let drive = table.register("drive").unwrap();
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
    let align_trig =
        bindings.add_trigger(Trigger::button("pad0_b", ButtonId::new(0, GamepadButton::B)));
    let align = bindings
        .register_command(
            "auto_align",
            Box::new(move || {
                Box::new(
                    TimedCommand::new("auto_align", ResourceSet::of(&[drive]), 2, move |ctx| {
                        ctx.outputs.unit_mut(drive).set_motor(0, -0.2)
                    })
                    .with_end(move |ctx| ctx.outputs.unit_mut(drive).set_motor(0, 0.0)),
                )
            }),
            scheduler.resources(),
        )
        .unwrap();
    bindings
        .bind(align_trig, BindAction::SchedulePress, align)
        .unwrap();

    let mut runner = CycleRunner::new(
        SequenceInput::new(frames),
        scheduler,
        bindings,
        AutoChooser::new(),
    );
    runner.request_phase(PhaseEvent::StartTeleop);

    runner.step(); // backfill
    let first_default = runner.scheduler().holder_of(drive).unwrap();

    runner.step(); // default follows the stick
    assert_eq!(runner.outputs().unit(drive).motor(0), 0.3);

    runner.step(); // align interrupts the default
    assert_eq!(runner.scheduler().active_names(), vec!["auto_align"]);
    let align_id = runner.scheduler().holder_of(drive).unwrap();
    assert_ne!(align_id, first_default);

    runner.step();
    assert_eq!(runner.outputs().unit(drive).motor(0), -0.2);
    runner.step();

    runner.step(); // align done: swept, drive released, a fresh default backfills
    let second_default = runner.scheduler().holder_of(drive).unwrap();
    assert_ne!(second_default, first_default);
    assert_ne!(second_default, align_id);
    assert_eq!(runner.outputs().unit(drive).motor(0), 0.0);

    runner.step(); // fresh default picks the stick back up
    assert_eq!(runner.outputs().unit(drive).motor(0), 0.3);
}
