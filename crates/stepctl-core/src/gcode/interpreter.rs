//! Buffers parsed commands, holds the per-axis configuration they're
//! resolved against, and lowers the buffer into a segment stream on
//! `start`. The interpreter never touches a [`Motor`] or [`Ticker`]
//! directly — `~`/`!`/`?` and friends only record what the embedding
//! driving loop should do next, via [`Interpreter::take_pending_action`].
//! That loop is the only thing that actually owns the hardware
//! capabilities, so it is also the only thing that can call
//! [`Interpreter::start`]/[`Interpreter::stop`].

#[cfg(feature = "std")]
use std::vec::Vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::axes::{AxesF, AxesI32};
use crate::capability::{Motor, Printer, Ticker};
use crate::command::{Command, DistanceMode};
use crate::executor::SegmentExecutor;
use crate::planner::PathPlanner;
use crate::segment::Segment;
use crate::trajectory::TrajectoryCompiler;

/// A control-character request the driving loop must act on, since the
/// interpreter itself has no handle on the executor or its capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    PositionReport,
    InfoReport,
    AxesReport,
}

/// Per-axis configuration plus the buffered command queue a line parser
/// feeds into. One `Interpreter` is built per axis-letter naming scheme
/// and tick rate; everything else can change live via the `M1xx` family.
pub struct Interpreter<const N: usize> {
    axis_names: [char; N],
    ticks_per_second: u32,
    steps_per_unit: AxesF<N>,
    max_velocity_units: AxesF<N>,
    max_acceleration_units: AxesF<N>,
    homing_velocity_units: AxesF<N>,
    min_position_units: AxesF<N>,
    max_position_units: AxesF<N>,
    mode: DistanceMode,
    commands: Vec<Command<N>>,
    pending_action: Option<Action>,
}

impl<const N: usize> Interpreter<N> {
    pub fn new(axis_names: [char; N], ticks_per_second: u32) -> Self {
        Self {
            axis_names,
            ticks_per_second,
            steps_per_unit: AxesF::splat(1.0),
            max_velocity_units: AxesF::splat(1.0),
            max_acceleration_units: AxesF::splat(1.0),
            homing_velocity_units: AxesF::splat(1.0),
            // Both bounds default to the same non-finite sentinel: position
            // clamping only ever engages once `M105`/`M106` make both
            // finite on a given axis.
            min_position_units: AxesF::splat(f32::INFINITY),
            max_position_units: AxesF::splat(f32::INFINITY),
            mode: DistanceMode::Absolute,
            commands: Vec::new(),
            pending_action: None,
        }
    }

    pub fn axis_names(&self) -> &[char; N] {
        &self.axis_names
    }

    pub fn pending_commands(&self) -> &[Command<N>] {
        &self.commands
    }

    pub fn take_pending_action(&mut self) -> Option<Action> {
        self.pending_action.take()
    }

    // -- derived quantities, recomputed from configuration at queue time --

    fn max_velocity(&self) -> AxesF<N> {
        (self.max_velocity_units * self.steps_per_unit / self.ticks_per_second as f32)
            .clamp(-1.0, 1.0)
    }

    fn max_acceleration(&self) -> AxesF<N> {
        self.max_acceleration_units * self.steps_per_unit
            / (self.ticks_per_second as f32 * self.ticks_per_second as f32)
    }

    fn homing_velocity(&self) -> AxesF<N> {
        (self.homing_velocity_units * self.steps_per_unit / self.ticks_per_second as f32)
            .clamp(-1.0, 1.0)
    }

    // -- grammar callbacks: the parser only ever calls these --

    pub fn feedrate_override(&mut self, _units_per_sec: f32) {
        // The reference this crate's command set was modeled on treats a
        // trailing `F` on `G1` as a no-op; velocity always comes from the
        // `M100` ceiling, never from the move itself.
    }

    pub fn append_move(&mut self, target_pos: AxesF<N>) {
        self.commands.push(Command::Move {
            target_pos,
            max_vel: self.max_velocity(),
            max_acc: self.max_acceleration(),
            mode: self.mode,
        });
    }

    pub fn append_wait(&mut self, seconds: f32) {
        self.commands.push(Command::Wait { seconds });
    }

    pub fn run_homing_cycle(&mut self) {
        self.commands.push(Command::Homing {
            velocity: self.homing_velocity(),
        });
    }

    pub fn set_distance_mode(&mut self, mode: DistanceMode) {
        self.mode = mode;
    }

    pub fn override_max_velocity(&mut self, raw: AxesF<N>) {
        self.max_velocity_units.copy_only_finite(raw);
        debug_assert!(self.max_velocity_units.all_positive());
    }

    pub fn override_max_acceleration(&mut self, raw: AxesF<N>) {
        self.max_acceleration_units.copy_only_finite(raw);
        debug_assert!(self.max_acceleration_units.all_positive());
    }

    pub fn override_steps_per_unit(&mut self, raw: AxesF<N>) {
        self.steps_per_unit.copy_only_finite(raw);
    }

    pub fn override_homing_velocity(&mut self, raw: AxesF<N>) {
        self.homing_velocity_units.copy_only_finite(raw);
        debug_assert!(self.homing_velocity_units.all_positive());
    }

    /// Unlike the `copy_only_finite` overrides above, `M105`/`M106`
    /// replace every axis unconditionally — there is no "leave this one
    /// alone" sentinel for a position bound.
    pub fn override_min_position(&mut self, raw: AxesF<N>) {
        self.min_position_units = raw;
    }

    pub fn override_max_position(&mut self, raw: AxesF<N>) {
        self.max_position_units = raw;
    }

    pub fn clear_commands_buffer(&mut self) {
        self.commands.clear();
    }

    pub fn request_start(&mut self) {
        self.pending_action = Some(Action::Start);
    }

    pub fn request_stop(&mut self) {
        self.pending_action = Some(Action::Stop);
    }

    pub fn request_position_report(&mut self) {
        self.pending_action = Some(Action::PositionReport);
    }

    pub fn request_info_report(&mut self) {
        self.pending_action = Some(Action::InfoReport);
    }

    pub fn request_axes_report(&mut self) {
        self.pending_action = Some(Action::AxesReport);
    }

    // -- actions the driving loop performs in response to take_pending_action --

    /// Compiles the buffered commands into segments and arms the executor.
    /// A no-op if the executor is already running.
    pub fn start<M: Motor<N>, T: Ticker>(&mut self, executor: &mut SegmentExecutor<N>, motor: &mut M, ticker: &mut T) {
        if executor.is_running() {
            return;
        }
        let segments = self.compile_pending(executor.position());
        executor.set_segments(segments);
        executor.start(motor, ticker);
    }

    pub fn stop<T: Ticker>(&mut self, executor: &mut SegmentExecutor<N>, ticker: &mut T) {
        self.clear_commands_buffer();
        executor.stop(ticker);
    }

    pub fn print_current_position(&self, executor: &SegmentExecutor<N>, printer: &mut impl Printer) {
        printer.print_str("Position:");
        printer.print_i32_slice(executor.position().as_slice());
    }

    pub fn print_info(&self, printer: &mut impl Printer) {
        printer.print_str("StepsPerUnit:");
        printer.print_f32_slice(self.steps_per_unit.as_slice());
        printer.print_str("MaxVelocity:");
        printer.print_f32_slice(self.max_velocity_units.as_slice());
        printer.print_str("MaxAcceleration:");
        printer.print_f32_slice(self.max_acceleration_units.as_slice());
        printer.print_str("HomingVelocity:");
        printer.print_f32_slice(self.homing_velocity_units.as_slice());
        printer.print_str("MinPosition:");
        printer.print_f32_slice(self.min_position_units.as_slice());
        printer.print_str("MaxPosition:");
        printer.print_f32_slice(self.max_position_units.as_slice());
    }

    pub fn print_axes(&self, printer: &mut impl Printer) {
        printer.print_str("Axes:");
        let mut buf = [0u8; 1];
        for &c in self.axis_names.iter() {
            buf[0] = c as u8;
            if let Ok(s) = core::str::from_utf8(&buf) {
                printer.print_str(s);
            }
        }
        printer.print_str("\n");
    }

    /// Converts one move's target into absolute steps, clamping to the
    /// configured position bounds where both are finite, and seeds the
    /// waypoint buffer with the current position on first use.
    fn resolve_move_target(
        &self,
        points: &mut Vec<AxesI32<N>>,
        curr_pos: AxesI32<N>,
        target_pos: AxesF<N>,
        mode: DistanceMode,
    ) -> AxesI32<N> {
        if points.is_empty() {
            points.push(curr_pos);
        }
        let mut target = curr_pos;
        for i in 0..N {
            if !target_pos.is_finite(i) {
                continue;
            }
            let mut units = target_pos[i];
            if self.min_position_units.is_finite(i) && self.max_position_units.is_finite(i) {
                units = units.clamp(self.min_position_units[i], self.max_position_units[i]);
            }
            let steps = (units * self.steps_per_unit[i]).round() as i32;
            target[i] = match mode {
                DistanceMode::Absolute => steps,
                DistanceMode::Relative => target[i] + steps,
            };
        }
        if points.last().map_or(true, |p| !p.eq_exact(target)) {
            points.push(target);
        }
        target
    }

    fn flush_waypoints(
        points: &mut Vec<AxesI32<N>>,
        trajectory: &mut Vec<Segment<N>>,
        velocity: AxesF<N>,
        acceleration: AxesF<N>,
    ) {
        if points.len() < 2 {
            return;
        }
        let last_point = *points.last().unwrap();
        let taken = core::mem::take(points);
        let mut planner = PathPlanner::new(taken, velocity, acceleration);
        if planner.update().is_ok() {
            let compiler = TrajectoryCompiler::new(
                planner.path().to_vec(),
                planner.durations_ticks(),
                planner.blend_durations_ticks(),
            );
            compiler.compile_into(trajectory);
        }
        points.push(last_point);
    }

    /// Lowers the buffered command queue into a flat segment stream,
    /// draining the buffer as it goes. A change in velocity/acceleration
    /// ceiling or a homing cycle forces the in-flight waypoint run to
    /// flush first, since a `PathPlanner` run only ever sees one pair of
    /// limits.
    fn compile_pending(&mut self, start_pos: AxesI32<N>) -> Vec<Segment<N>> {
        let mut points: Vec<AxesI32<N>> = Vec::new();
        let mut trajectory: Vec<Segment<N>> = Vec::new();
        let mut curr_pos = start_pos;
        let mut velocity = AxesF::zero();
        let mut acceleration = AxesF::zero();

        for cmd in core::mem::take(&mut self.commands) {
            match cmd {
                Command::Move {
                    target_pos,
                    max_vel,
                    max_acc,
                    mode,
                } => {
                    if max_vel != velocity || max_acc != acceleration {
                        Self::flush_waypoints(&mut points, &mut trajectory, velocity, acceleration);
                        velocity = max_vel;
                        acceleration = max_acc;
                    }
                    curr_pos = self.resolve_move_target(&mut points, curr_pos, target_pos, mode);
                }
                Command::Wait { seconds } => {
                    if seconds < 0.0 {
                        continue;
                    }
                    Self::flush_waypoints(&mut points, &mut trajectory, velocity, acceleration);
                    if seconds > 0.0 {
                        let ticks = (seconds * self.ticks_per_second as f32).round() as i32;
                        if ticks > 0 {
                            trajectory.push(Segment::wait(ticks));
                        }
                    }
                }
                Command::Homing { velocity: homing_v } => {
                    Self::flush_waypoints(&mut points, &mut trajectory, velocity, acceleration);
                    points.clear();
                    trajectory.push(Segment::homing(homing_v));
                    curr_pos = AxesI32::zero();
                }
            }
        }
        Self::flush_waypoints(&mut points, &mut trajectory, velocity, acceleration);
        trajectory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axes::Axes;

    #[test]
    fn default_derived_quantities_are_clamped() {
        let interp = Interpreter::<1>::new(['X'], 1);
        assert_eq!(interp.max_velocity().0, [1.0]);
    }

    #[test]
    fn single_move_compiles_to_segments() {
        let mut interp = Interpreter::<1>::new(['X'], 10);
        interp.override_max_velocity(Axes([5.0]));
        interp.override_max_acceleration(Axes([1.0]));
        interp.append_move(Axes([5.0]));
        let segs = interp.compile_pending(Axes::<i32, 1>::zero());
        assert!(!segs.is_empty());
    }

    #[test]
    fn negative_wait_is_skipped_without_flushing() {
        let mut interp = Interpreter::<1>::new(['X'], 10);
        interp.append_move(Axes([5.0]));
        interp.append_wait(-1.0);
        interp.append_move(Axes([10.0]));
        let segs = interp.compile_pending(Axes::<i32, 1>::zero());
        // A `Wait` segment has `denominator == 1`; a skipped negative wait
        // must never materialize one.
        assert!(!segs.iter().any(|s| s.denominator == 1));
        let total: i32 = segs.iter().filter(|s| s.dt > 0).map(|s| s.dt).sum();
        assert!(total > 0);
    }

    #[test]
    fn homing_resets_planning_position_to_origin() {
        let mut interp = Interpreter::<2>::new(['X', 'Y'], 10);
        interp.run_homing_cycle();
        interp.append_move(Axes([1.0, 1.0]));
        let segs = interp.compile_pending(Axes([50, 50]));
        assert!(segs.iter().any(|s| s.is_homing()));
    }

    #[test]
    fn min_max_position_clamp_only_when_both_finite() {
        let mut interp = Interpreter::<1>::new(['X'], 10);
        interp.override_min_position(Axes([0.0]));
        interp.override_max_position(Axes([2.0]));
        let mut points = Vec::new();
        let target = interp.resolve_move_target(&mut points, Axes::<i32, 1>::zero(), Axes([100.0]), DistanceMode::Absolute);
        assert_eq!(target.0, [2]);
    }
}
