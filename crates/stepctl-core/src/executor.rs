//! `SegmentExecutor`: the real-time tick loop. Integrates the current
//! [`Segment`] with an extended Bresenham algorithm, advances through the
//! segment stream, and runs the homing variant. Every method on the hot
//! path is a fixed, branch-predictable sequence: no allocation, no
//! floating point, no locking.

#[cfg(feature = "std")]
use std::boxed::Box;
#[cfg(feature = "std")]
use std::vec::Vec;
#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::axes::AxesI32;
use crate::capability::{Motor, Ticker};
use crate::segment::Segment;

type Callback = Box<dyn FnMut()>;

/// Drives a segment stream in real time, one tick at a time.
pub struct SegmentExecutor<const N: usize> {
    segments: Vec<Segment<N>>,
    cursor: usize,
    position: AxesI32<N>,
    direction: [bool; N],
    ticks_per_second: u32,
    current_tick: u64,
    running: bool,
    on_started: Option<Callback>,
    on_stopped: Option<Callback>,
}

impl<const N: usize> Default for SegmentExecutor<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SegmentExecutor<N> {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            cursor: 0,
            position: AxesI32::zero(),
            direction: [false; N],
            ticks_per_second: 1,
            current_tick: 0,
            running: false,
            on_started: None,
            on_stopped: None,
        }
    }

    pub fn set_ticks_per_second(&mut self, tps: u32) {
        debug_assert!(tps > 0, "ticks_per_second must be positive");
        self.ticks_per_second = tps;
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Replaces the segment stream. The caller must ensure `running()` is
    /// `false` first: this never happens mid-execution on the tick path.
    pub fn set_segments(&mut self, segments: Vec<Segment<N>>) {
        debug_assert!(!self.running, "segments replaced while executor running");
        self.segments = segments;
        self.cursor = self.segments.len();
    }

    pub fn segments(&self) -> &[Segment<N>] {
        &self.segments
    }

    pub fn position(&self) -> AxesI32<N> {
        self.position
    }

    pub fn set_position(&mut self, position: AxesI32<N>) {
        self.position = position;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn set_on_started(&mut self, cb: Callback) {
        self.on_started = Some(cb);
    }

    pub fn set_on_stopped(&mut self, cb: Callback) {
        self.on_stopped = Some(cb);
    }

    /// Primes the executor and arms the ticker. If the segment stream is
    /// empty this immediately runs the stop path instead.
    pub fn start<T: Ticker>(&mut self, motor: &mut impl Motor<N>, ticker: &mut T) {
        if let Some(cb) = self.on_started.as_mut() {
            cb();
        }
        self.cursor = 0;
        self.current_tick = 0;
        self.direction = [false; N];
        self.write_all_directions(motor);
        if self.segments.is_empty() {
            self.stop(ticker);
        } else {
            self.running = true;
            let period_us = 1_000_000 / self.ticks_per_second;
            ticker.attach_us(period_us);
        }
    }

    /// Detaches the ticker, clears the cursor and running flag, and fires
    /// `on_stopped` if set.
    pub fn stop<T: Ticker>(&mut self, ticker: &mut T) {
        ticker.detach();
        self.cursor = self.segments.len();
        self.running = false;
        if let Some(cb) = self.on_stopped.as_mut() {
            cb();
        }
    }

    /// Runs one tick of integration. Must be called once per ticker period
    /// while `is_running()`.
    pub fn tick<T: Ticker>(&mut self, motor: &mut impl Motor<N>, ticker: &mut T) {
        loop {
            if self.cursor >= self.segments.len() {
                self.stop(ticker);
                return;
            }
            let dt = self.segments[self.cursor].dt;
            if dt > 0 {
                self.integrate_one(motor);
                return;
            } else if dt == 0 {
                self.cursor += 1;
                continue;
            } else {
                self.tick_homing(motor);
                return;
            }
        }
    }

    /// One Bresenham integration step of the current (non-homing) segment.
    fn integrate_one(&mut self, motor: &mut impl Motor<N>) {
        motor.begin();
        self.segments[self.cursor].dt -= 1;
        self.current_tick += 1;

        let mut step = [false; N];
        let mut any_dir_changed = false;
        for i in 0..N {
            let new_dir = self.segments[self.cursor].velocity[i] < 0;
            if new_dir != self.direction[i] {
                any_dir_changed = true;
            }
            self.direction[i] = new_dir;
        }
        if any_dir_changed {
            self.write_all_directions(motor);
        }

        let mut any_step = false;
        for i in 0..N {
            let denom = self.segments[self.cursor].denominator;
            let vel = self.segments[self.cursor].velocity[i];
            let accel = self.segments[self.cursor].acceleration[i];
            let sign: i64 = if vel >= 0 { 1 } else { -1 };

            let err = self.segments[self.cursor].error[i] + vel;
            self.segments[self.cursor].error[i] = err;

            if 2 * sign * err >= denom {
                self.segments[self.cursor].error[i] -= sign * denom;
                self.position[i] += sign as i32;
                step[i] = true;
                any_step = true;
            }
            self.segments[self.cursor].velocity[i] += accel as i64;
        }

        if any_step {
            for i in 0..N {
                motor.write_step(i, step[i]);
            }
            for i in 0..N {
                motor.write_step(i, false);
            }
        }
        motor.end();
    }

    fn tick_homing(&mut self, motor: &mut impl Motor<N>) {
        let any_moving = (0..N).any(|i| self.segments[self.cursor].velocity[i] != 0);
        if any_moving {
            self.integrate_one(motor);
            for i in 0..N {
                if self.segments[self.cursor].velocity[i] != 0 && motor.end_switch_hit(i) {
                    self.segments[self.cursor].velocity[i] = 0;
                }
            }
        } else {
            self.segments[self.cursor].dt = 0;
            self.position = AxesI32::zero();
        }
    }

    fn write_all_directions(&self, motor: &mut impl Motor<N>) {
        for i in 0..N {
            motor.write_direction(i, self.direction[i]);
        }
    }
}
