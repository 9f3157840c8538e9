//! # stepctl-sim
//!
//! A single-process stand-in for the board this crate's motion pipeline
//! was built to run on. It reads a rig configuration and a plain-text
//! command program, feeds each line through [`stepctl_core::Parser`] and
//! [`stepctl_core::Interpreter`], and drives [`stepctl_core::SegmentExecutor`]
//! tick by tick against an in-memory motor instead of real hardware.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser as ClapParser, Subcommand};
use tracing::info;

use stepctl_core::gcode::interpreter::Action;
use stepctl_core::axes::Axes;
use stepctl_core::{Interpreter, Parser, SegmentExecutor};

mod config;
mod error;
mod rig;

use config::{RigConfig, AXIS_COUNT};
use error::SimError;
use rig::{SimMotor, SimPrinter, SimTicker};

/// A host-side driver for the stepper motion pipeline.
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a command program against a simulated rig.
    Play(PlayArgs),
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Path to a TOML rig configuration. Defaults to an untuned X/Y/Z rig
    /// if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a file of newline-separated motion commands.
    program: PathBuf,

    /// Upper bound on ticks run after the program finishes streaming, to
    /// catch a program that never reaches a stopped state.
    #[arg(long, default_value_t = 10_000_000)]
    max_ticks: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Play(args) => run_play(args),
    }
}

fn run_play(args: PlayArgs) -> Result<()> {
    let rig = match &args.config {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default_for_axes(['X', 'Y', 'Z']),
    };
    info!(axis_names = ?rig.axis_names, ticks_per_second = rig.ticks_per_second, "rig configured");

    let mut interp = Interpreter::<AXIS_COUNT>::new(rig.axis_names, rig.ticks_per_second);
    if let Some(spu) = rig.steps_per_unit {
        interp.override_steps_per_unit(Axes(spu));
    }
    if let Some(v) = rig.max_velocity {
        interp.override_max_velocity(Axes(v));
    }
    if let Some(a) = rig.max_acceleration {
        interp.override_max_acceleration(Axes(a));
    }
    if let Some(v) = rig.homing_velocity {
        interp.override_homing_velocity(Axes(v));
    }

    let mut executor = SegmentExecutor::<AXIS_COUNT>::new();
    executor.set_ticks_per_second(rig.ticks_per_second);
    let mut motor = SimMotor::new(rig.home_offsets.unwrap_or([0; AXIS_COUNT]));
    let mut ticker = SimTicker::default();
    let mut printer = SimPrinter;

    let program = std::fs::read_to_string(&args.program)?;
    for line in program.lines() {
        let line_with_newline = format!("{line}\n");
        let _ = Parser::parse_line(&mut interp, &mut printer, &line_with_newline);
        match interp.take_pending_action() {
            Some(Action::Start) => interp.start(&mut executor, &mut motor, &mut ticker),
            Some(Action::Stop) => interp.stop(&mut executor, &mut ticker),
            Some(Action::PositionReport) => interp.print_current_position(&executor, &mut printer),
            Some(Action::InfoReport) => interp.print_info(&mut printer),
            Some(Action::AxesReport) => interp.print_axes(&mut printer),
            None => {}
        }
    }

    let mut ticks = 0u64;
    while executor.is_running() {
        motor.observe_position(executor.position().0);
        executor.tick(&mut motor, &mut ticker);
        ticks += 1;
        if ticks > args.max_ticks {
            return Err(SimError::DidNotConverge(ticks).into());
        }
    }

    info!(final_position = ?executor.position().0, steps = ?motor.step_counts(), "program complete");
    Ok(())
}
