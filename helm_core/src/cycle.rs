//! The fixed-rate control loop.
//!
//! One control cycle: sample operator input into an [`InputFrame`], refresh
//! every trigger (memoized edges), run the binding pass, then
//! [`Scheduler::tick`]. The runner also owns the phase machine and performs
//! the side effects of phase changes: scheduling the selected autonomous
//! routine, canceling it on teleop handoff, canceling everything on disable.
//!
//! Triggers sample even while the robot is `Disabled` so edge history stays
//! continuous: a button held across re-enable produces no rising edge.
//!
//! # Pacing
//! The default loop paces with monotonic `Instant` plus `thread::sleep`.
//! With the `rt` feature the loop locks memory, pins a core, requests
//! `SCHED_FIFO`, and sleeps to absolute deadlines via
//! `clock_nanosleep(TIMER_ABSTIME)`. Overruns are counted and logged in
//! either mode; a driving robot must not stop over a late cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use helm_common::consts::DEFAULT_CYCLE_TIME;
use helm_common::input::{InputFrame, InputSource};
use helm_common::output::ActuatorBank;

use crate::auto::AutoChooser;
use crate::binding::BindingTable;
use crate::command::{CommandId, CycleCtx};
use crate::phase::{PhaseEvent, PhaseMachine, PhaseTransition, RobotPhase};
use crate::scheduler::{ScheduleOutcome, Scheduler};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics, updated without allocation.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Cycles that exceeded the period.
    pub overruns: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record one cycle duration.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
    }

    /// Average cycle time [ns] (0 before the first cycle).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Error type for the loop and its scheduling-class setup.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A real-time setup call failed.
    #[error("rt setup failed: {0}")]
    RtSetup(String),
}

// ─── RT setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn lock_memory() -> Result<(), RunnerError> {
    use nix::sys::mman::{mlockall, MlockallFlags};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RunnerError::RtSetup(format!("mlockall: {e}")))
}

#[cfg(feature = "rt")]
fn prefault_stack() {
    // Touch a chunk of stack so the locked pages exist before the loop.
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn pin_cpu(cpu: usize) -> Result<(), RunnerError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RunnerError::RtSetup(format!("CpuSet::set({cpu}): {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RunnerError::RtSetup(format!("sched_setaffinity: {e}")))
}

#[cfg(feature = "rt")]
fn set_fifo_priority(priority: i32) -> Result<(), RunnerError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RunnerError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}): {err}"
        )));
    }
    Ok(())
}

/// Prepare the control thread: lock memory, prefault stack, pin to `cpu`,
/// request `SCHED_FIFO` at `priority`. Call once before [`CycleRunner::run`].
#[cfg(feature = "rt")]
pub fn rt_setup(cpu: usize, priority: i32) -> Result<(), RunnerError> {
    lock_memory()?;
    prefault_stack();
    pin_cpu(cpu)?;
    set_fifo_priority(priority)?;
    Ok(())
}

/// Without the `rt` feature this is a no-op and always succeeds.
#[cfg(not(feature = "rt"))]
pub fn rt_setup(_cpu: usize, _priority: i32) -> Result<(), RunnerError> {
    Ok(())
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Owns the whole control stack: input source, binding table, scheduler,
/// autonomous chooser, phase machine, actuator bank, and cycle statistics.
pub struct CycleRunner<I: InputSource> {
    input: I,
    bindings: BindingTable,
    scheduler: Scheduler,
    chooser: AutoChooser,
    phases: PhaseMachine,
    bank: ActuatorBank,
    stats: CycleStats,
    cycle: u64,
    cycle_time: Duration,
    /// Live autonomous routine, canceled on teleop handoff.
    auto_command: Option<CommandId>,
}

impl<I: InputSource> CycleRunner<I> {
    /// Assemble a runner; starts `Disabled` at the default 50 Hz period.
    pub fn new(
        input: I,
        scheduler: Scheduler,
        bindings: BindingTable,
        chooser: AutoChooser,
    ) -> Self {
        Self {
            input,
            bindings,
            scheduler,
            chooser,
            phases: PhaseMachine::new(),
            bank: ActuatorBank::new(),
            stats: CycleStats::new(),
            cycle: 0,
            cycle_time: DEFAULT_CYCLE_TIME,
            auto_command: None,
        }
    }

    pub fn set_cycle_time(&mut self, period: Duration) {
        self.cycle_time = period;
    }

    pub fn cycle_time(&self) -> Duration {
        self.cycle_time
    }

    pub fn phase(&self) -> RobotPhase {
        self.phases.phase()
    }

    pub fn cycle_index(&self) -> u64 {
        self.cycle
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Demanded actuator outputs after the most recent cycle.
    pub fn outputs(&self) -> &ActuatorBank {
        &self.bank
    }

    pub fn chooser(&self) -> &AutoChooser {
        &self.chooser
    }

    pub fn chooser_mut(&mut self) -> &mut AutoChooser {
        &mut self.chooser
    }

    /// Request a phase change; on success the transition's side effects run
    /// immediately against a blank input frame.
    pub fn request_phase(&mut self, event: PhaseEvent) -> PhaseTransition {
        let transition = self.phases.apply(event);
        match &transition {
            PhaseTransition::Ok(next) => self.on_phase_entered(*next),
            PhaseTransition::Rejected(reason) => {
                warn!(?event, reason, "phase change rejected");
            }
        }
        transition
    }

    fn on_phase_entered(&mut self, phase: RobotPhase) {
        let frame = InputFrame::default();
        let mut ctx = CycleCtx {
            cycle: self.cycle,
            input: &frame,
            outputs: &mut self.bank,
        };
        match phase {
            RobotPhase::Disabled => {
                self.scheduler.cancel_all(&mut ctx);
                self.auto_command = None;
                self.bank.stop_all_motors();
                info!("disabled: all commands canceled, motors stopped");
            }
            RobotPhase::Autonomous => match self.chooser.make_selected() {
                Ok(command) => {
                    let routine = command.name().to_string();
                    match self.scheduler.schedule(command, &mut ctx) {
                        ScheduleOutcome::Scheduled(id) => {
                            self.auto_command = Some(id);
                            info!(routine = routine.as_str(), %id, "autonomous started");
                        }
                        ScheduleOutcome::Rejected(reason) => {
                            warn!(routine = routine.as_str(), ?reason, "autonomous rejected");
                        }
                    }
                }
                Err(err) => warn!(%err, "entering autonomous with no routine"),
            },
            RobotPhase::Teleop => {
                if let Some(id) = self.auto_command.take() {
                    if self.scheduler.cancel(id, &mut ctx) {
                        info!(%id, "autonomous canceled for teleop");
                    }
                }
            }
        }
    }

    /// Run one control cycle.
    ///
    /// Triggers refresh in every phase. The binding pass only applies in
    /// `Teleop`; the scheduler only ticks while enabled.
    pub fn step(&mut self) {
        self.cycle += 1;
        self.input.begin_cycle(self.cycle);
        let frame = self.input.frame();
        self.bindings.refresh(self.cycle, &frame);

        let phase = self.phases.phase();
        if phase.is_enabled() {
            let mut ctx = CycleCtx {
                cycle: self.cycle,
                input: &frame,
                outputs: &mut self.bank,
            };
            if phase == RobotPhase::Teleop {
                self.bindings.apply(&mut self.scheduler, &mut ctx);
            }
            self.scheduler.tick(&mut ctx);
        }
    }

    /// Paced loop until `running` clears or `max_cycles` is reached.
    pub fn run(
        &mut self,
        running: &AtomicBool,
        max_cycles: Option<u64>,
    ) -> Result<(), RunnerError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(running, max_cycles)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_paced_loop(running, max_cycles)
        }
    }

    #[cfg(not(feature = "rt"))]
    fn run_paced_loop(
        &mut self,
        running: &AtomicBool,
        max_cycles: Option<u64>,
    ) -> Result<(), RunnerError> {
        while running.load(Ordering::Relaxed) {
            if max_cycles.is_some_and(|limit| self.cycle >= limit) {
                break;
            }
            let start = Instant::now();
            self.step();
            let elapsed = start.elapsed();
            self.stats.record(elapsed.as_nanos() as i64);

            if elapsed > self.cycle_time {
                self.stats.overruns += 1;
                warn!(
                    cycle = self.cycle,
                    elapsed_us = elapsed.as_micros() as u64,
                    period_us = self.cycle_time.as_micros() as u64,
                    "cycle overrun"
                );
            }
            if let Some(remaining) = self.cycle_time.checked_sub(elapsed) {
                thread::sleep(remaining);
            }
        }
        Ok(())
    }

    /// Absolute-deadline loop on `CLOCK_MONOTONIC` for drift-free pacing.
    #[cfg(feature = "rt")]
    fn run_rt_loop(
        &mut self,
        running: &AtomicBool,
        max_cycles: Option<u64>,
    ) -> Result<(), RunnerError> {
        use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = self.cycle_time.as_nanos() as i64;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| RunnerError::RtSetup(format!("clock_gettime: {e}")))?;

        while running.load(Ordering::Relaxed) {
            if max_cycles.is_some_and(|limit| self.cycle >= limit) {
                break;
            }
            next_wake = timespec_add_ns(next_wake, period_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| RunnerError::RtSetup(format!("clock_gettime: {e}")))?;
            self.step();
            let cycle_end = clock_gettime(clock)
                .map_err(|e| RunnerError::RtSetup(format!("clock_gettime: {e}")))?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns);
            if duration_ns > period_ns {
                self.stats.overruns += 1;
                warn!(
                    cycle = self.cycle,
                    duration_ns,
                    period_ns,
                    "cycle overrun"
                );
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }
}

// ─── Time helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    let total = ts.tv_nsec() + ns;
    nix::sys::time::TimeSpec::new(
        ts.tv_sec() + total.div_euclid(1_000_000_000),
        total.rem_euclid(1_000_000_000),
    )
}

#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}
