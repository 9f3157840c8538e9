//! End-to-end scenarios driving the full pipeline: text line in, stepped
//! motor output out. Each test wires a mock `Motor`/`Ticker`/`Printer` to
//! an `Interpreter` + `SegmentExecutor` pair and runs ticks to completion.
//! Tick rate is kept at 1 per "second" throughout so velocity/acceleration
//! overrides can be read directly as steps-per-tick/steps-per-tick-squared
//! without doing the unit-to-tick conversion by hand in every assertion.

use stepctl_core::gcode::interpreter::Action;
use stepctl_core::{Interpreter, Motor, ParseError, Parser, Printer, SegmentExecutor, Ticker};

struct RecordingMotor<const N: usize> {
    position: [i32; N],
    switch_at: [Option<i32>; N],
}

impl<const N: usize> Default for RecordingMotor<N> {
    fn default() -> Self {
        Self {
            position: [0; N],
            switch_at: [None; N],
        }
    }
}

impl<const N: usize> Motor<N> for RecordingMotor<N> {
    fn write_step(&mut self, _axis: usize, _level: bool) {}
    fn write_direction(&mut self, _axis: usize, _dir: bool) {}
    fn end_switch_hit(&mut self, axis: usize) -> bool {
        match self.switch_at[axis] {
            Some(trigger) => self.position[axis] <= trigger,
            None => false,
        }
    }
}

#[derive(Default)]
struct IdleTicker {
    attached: bool,
}

impl Ticker for IdleTicker {
    fn attach_us(&mut self, _period_us: u32) {
        self.attached = true;
    }
    fn detach(&mut self) {
        self.attached = false;
    }
}

#[derive(Default)]
struct LogPrinter {
    out: Vec<String>,
}

impl Printer for LogPrinter {
    fn print_str(&mut self, s: &str) {
        self.out.push(s.to_string());
    }
    fn print_f32_slice(&mut self, _values: &[f32]) {}
    fn print_i32_slice(&mut self, _values: &[i32]) {}
}

fn run_to_completion<const N: usize>(
    executor: &mut SegmentExecutor<N>,
    motor: &mut RecordingMotor<N>,
    ticker: &mut IdleTicker,
) {
    let mut guard = 0;
    while executor.is_running() {
        motor.position = executor.position().0;
        executor.tick(motor, ticker);
        guard += 1;
        assert!(guard < 200_000, "executor never converged");
    }
}

#[test]
fn one_axis_linear_move_reaches_target() {
    let mut interp = Interpreter::<1>::new(['X'], 1);
    let mut printer = LogPrinter::default();
    let mut executor = SegmentExecutor::<1>::new();
    let mut motor = RecordingMotor::default();
    let mut ticker = IdleTicker::default();

    Parser::parse_line(&mut interp, &mut printer, "M100 X0.5\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "M101 X0.01\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G1 X200\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "~\n").unwrap();

    assert_eq!(interp.take_pending_action(), Some(Action::Start));
    interp.start(&mut executor, &mut motor, &mut ticker);
    run_to_completion(&mut executor, &mut motor, &mut ticker);

    assert_eq!(executor.position().0, [200]);
}

#[test]
fn two_axis_diagonal_move_reaches_target() {
    let mut interp = Interpreter::<2>::new(['X', 'Y'], 1);
    let mut printer = LogPrinter::default();
    let mut executor = SegmentExecutor::<2>::new();
    let mut motor = RecordingMotor::default();
    let mut ticker = IdleTicker::default();

    Parser::parse_line(&mut interp, &mut printer, "M100 X0.5 Y0.5\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "M101 X0.01 Y0.01\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G1 X150 Y-150\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "~\n").unwrap();
    interp.take_pending_action();
    interp.start(&mut executor, &mut motor, &mut ticker);
    run_to_completion(&mut executor, &mut motor, &mut ticker);

    assert_eq!(executor.position().0, [150, -150]);
}

#[test]
fn homing_cycle_zeroes_position_at_switches() {
    let mut interp = Interpreter::<2>::new(['X', 'Y'], 1);
    let mut printer = LogPrinter::default();
    let mut executor = SegmentExecutor::<2>::new();
    executor.set_position(stepctl_core::axes::Axes([50, 50]));
    let mut motor = RecordingMotor::<2>::default();
    motor.switch_at = [Some(-10), Some(-20)];
    let mut ticker = IdleTicker::default();

    Parser::parse_line(&mut interp, &mut printer, "M103 X0.5 Y0.3\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G28\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "~\n").unwrap();
    interp.take_pending_action();
    interp.start(&mut executor, &mut motor, &mut ticker);
    run_to_completion(&mut executor, &mut motor, &mut ticker);

    assert_eq!(executor.position().0, [0, 0]);
}

#[test]
fn wait_between_moves_inserts_a_pause() {
    let mut interp = Interpreter::<1>::new(['X'], 1);
    let mut printer = LogPrinter::default();
    let mut executor = SegmentExecutor::<1>::new();
    let mut motor = RecordingMotor::default();
    let mut ticker = IdleTicker::default();

    Parser::parse_line(&mut interp, &mut printer, "M100 X0.5\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "M101 X0.01\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G1 X100\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G4 P5\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G1 X200\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "~\n").unwrap();
    interp.take_pending_action();
    interp.start(&mut executor, &mut motor, &mut ticker);

    assert!(executor.segments().iter().any(|s| s.denominator == 1));
    run_to_completion(&mut executor, &mut motor, &mut ticker);
    assert_eq!(executor.position().0, [200]);
}

#[test]
fn blend_slow_down_still_reaches_every_waypoint() {
    let mut interp = Interpreter::<2>::new(['X', 'Y'], 1);
    let mut printer = LogPrinter::default();
    let mut executor = SegmentExecutor::<2>::new();
    let mut motor = RecordingMotor::default();
    let mut ticker = IdleTicker::default();

    Parser::parse_line(&mut interp, &mut printer, "M100 X0.4 Y0.4\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "M101 X0.003 Y0.003\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G1 X300 Y-300\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "G1 X0 Y0\n").unwrap();
    Parser::parse_line(&mut interp, &mut printer, "~\n").unwrap();
    interp.take_pending_action();
    interp.start(&mut executor, &mut motor, &mut ticker);
    run_to_completion(&mut executor, &mut motor, &mut ticker);

    assert_eq!(executor.position().0, [0, 0]);
}

#[test]
fn malformed_line_reports_error_and_recovers() {
    let mut interp = Interpreter::<1>::new(['X'], 1);
    let mut printer = LogPrinter::default();

    let err = Parser::parse_line(&mut interp, &mut printer, "G99\n").unwrap_err();
    assert_eq!(err, ParseError::UnknownCommand { offset: 3 });
    assert_eq!(interp.pending_commands().len(), 0);
    assert!(printer.out.iter().any(|l| l.starts_with("Error:")));

    // The buffer was cleared, and the next well-formed line still parses.
    Parser::parse_line(&mut interp, &mut printer, "G1 X10\n").unwrap();
    assert_eq!(interp.pending_commands().len(), 1);
}
