//! Robot control binary.
//!
//! Assembles the subsystem table, binding map, and autonomous chooser from
//! the TOML configuration, then drives the fixed-rate cycle runner. With
//! `--script` the operator pads are played from a timeline file instead of
//! live hardware, which is how match logic gets exercised on a desk.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use helm_common::config::{ConfigError, ConfigLoader, LogLevel};
use helm_common::input::{IdleInput, InputSource};
use helm_core::cycle::{rt_setup, CycleRunner};
use helm_core::phase::PhaseEvent;
use helm_core::resource::ResourceTable;
use helm_core::scheduler::Scheduler;

use helm_robot::config::RobotConfig;
use helm_robot::sim::ScriptedInput;
use helm_robot::subsystems::Subsystems;
use helm_robot::{bindings, commands};

/// Cycles to keep running after the last scripted event.
const SCRIPT_TAIL_CYCLES: u64 = 250;

#[derive(Parser, Debug)]
#[command(
    name = "helm_robot",
    author,
    version,
    about = "Command-scheduled robot control loop"
)]
struct Args {
    /// Path to the robot configuration file
    #[arg(short, long, default_value = "config/robot.toml")]
    config: PathBuf,

    /// Input script to play instead of live pads
    #[arg(long)]
    script: Option<PathBuf>,

    /// Stop after this many control cycles
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Run autonomous for this many cycles before teleop
    #[arg(long, default_value_t = 0)]
    auto_cycles: u64,

    /// CPU core to pin the control thread to (rt builds)
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority for the control thread (rt builds)
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable debug logging (overrides the configured level)
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!(config = %args.config.display(), "FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "helm robot starting"
    );

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("helm robot shut down cleanly");
}

fn load_config(path: &Path) -> Result<RobotConfig, ConfigError> {
    let config = RobotConfig::load(path)?;
    config.validate().map_err(ConfigError::ValidationError)?;
    Ok(config)
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        tracing_level(configured)
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if args.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn run(args: &Args, config: &RobotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut table = ResourceTable::new();
    let subs = Subsystems::register(&mut table)?;
    commands::install_defaults(&mut table, subs, config)?;

    let scheduler = Scheduler::new(table);
    let bindings = bindings::build(subs, config, scheduler.resources())?;
    let chooser = commands::build_chooser(subs, config)?;

    info!(
        resources = scheduler.resources().len(),
        commands = bindings.command_count(),
        bindings = bindings.binding_count(),
        routine = chooser.selected_name().unwrap_or("none"),
        "robot assembled"
    );

    rt_setup(args.cpu_core, args.rt_priority)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("shutdown signal received");
        r.store(false, Ordering::SeqCst);
    })?;

    match &args.script {
        Some(path) => {
            let script = ScriptedInput::from_file(path)?;
            info!(
                script = %path.display(),
                events = script.remaining(),
                "playing scripted input"
            );
            // A scripted run ends shortly after its final event unless the
            // caller capped it tighter.
            let max_cycles = args
                .max_cycles
                .or_else(|| script.last_cycle().map(|c| c + SCRIPT_TAIL_CYCLES));
            let runner = CycleRunner::new(script, scheduler, bindings, chooser);
            drive(runner, args, &running, max_cycles)
        }
        None => {
            let runner = CycleRunner::new(IdleInput, scheduler, bindings, chooser);
            drive(runner, args, &running, args.max_cycles)
        }
    }
}

/// Autonomous for `--auto-cycles`, then teleop until stopped or capped.
fn drive<I: InputSource>(
    mut runner: CycleRunner<I>,
    args: &Args,
    running: &AtomicBool,
    max_cycles: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.auto_cycles > 0 {
        runner.request_phase(PhaseEvent::StartAutonomous);
        let auto_end = runner.cycle_index() + args.auto_cycles;
        let auto_cap = match max_cycles {
            Some(limit) => auto_end.min(limit),
            None => auto_end,
        };
        runner.run(running, Some(auto_cap))?;
    }

    let capped = max_cycles.is_some_and(|limit| runner.cycle_index() >= limit);
    if running.load(Ordering::SeqCst) && !capped {
        runner.request_phase(PhaseEvent::StartTeleop);
        runner.run(running, max_cycles)?;
    }

    runner.request_phase(PhaseEvent::Disable);

    let stats = runner.stats();
    info!(
        cycles = stats.cycle_count,
        avg_us = stats.avg_cycle_ns() / 1_000,
        max_us = stats.max_cycle_ns / 1_000,
        overruns = stats.overruns,
        "run complete"
    );
    Ok(())
}
