//! Virtual hardware: the `Motor`/`Ticker`/`Printer` capabilities
//! `stepctl-core` needs, implemented against in-memory state and
//! `tracing` output instead of real GPIO and a hardware timer.

use stepctl_core::{Motor, Printer, Ticker};
use tracing::{debug, info};

pub struct SimMotor<const N: usize> {
    position: [i32; N],
    step_count: [u64; N],
    home_offsets: [i32; N],
}

impl<const N: usize> SimMotor<N> {
    pub fn new(home_offsets: [i32; N]) -> Self {
        Self {
            position: [0; N],
            step_count: [0; N],
            home_offsets,
        }
    }

    pub fn observe_position(&mut self, position: [i32; N]) {
        self.position = position;
    }

    pub fn step_counts(&self) -> [u64; N] {
        self.step_count
    }
}

impl<const N: usize> Motor<N> for SimMotor<N> {
    fn write_step(&mut self, axis: usize, level: bool) {
        if level {
            self.step_count[axis] += 1;
        }
    }

    fn write_direction(&mut self, axis: usize, dir: bool) {
        debug!(axis, dir, "direction line set");
    }

    fn end_switch_hit(&mut self, axis: usize) -> bool {
        self.position[axis] <= self.home_offsets[axis]
    }
}

/// A ticker with nothing to arm: the driving loop in `main` calls
/// `SegmentExecutor::tick` directly in a plain loop rather than waiting on
/// a real periodic interrupt, so this only has to remember whether it is
/// "armed" for `SegmentExecutor::start`/`stop` bookkeeping.
#[derive(Default)]
pub struct SimTicker;

impl Ticker for SimTicker {
    fn attach_us(&mut self, period_us: u32) {
        info!(period_us, "ticker armed");
    }

    fn detach(&mut self) {
        info!("ticker disarmed");
    }
}

pub struct SimPrinter;

impl Printer for SimPrinter {
    fn print_str(&mut self, s: &str) {
        info!("{}", s.trim_end());
    }

    fn print_f32_slice(&mut self, values: &[f32]) {
        info!(?values);
    }

    fn print_i32_slice(&mut self, values: &[i32]) {
        info!(?values);
    }
}
