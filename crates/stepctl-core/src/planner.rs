//! `PathPlanner`: turns an integer waypoint path into per-segment durations,
//! blend durations and linear velocities, respecting per-axis velocity and
//! acceleration limits.
//!
//! This is a parabolic-blend trajectory smoother in the style of Kunz &
//! Stilman's "Turning Paths Into Trajectories Using Parabolic Blends": each
//! waypoint gets a short constant-acceleration blend region, separated by
//! constant-velocity linear regions, with a slow-down pass that shrinks
//! velocities until no blend would eat more than half of either adjacent
//! linear region.

#[cfg(feature = "std")]
use std::vec::Vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::axes::{AxesF, AxesI32};
use crate::error::PlanError;

const EPSILON: f32 = 1e-6;

/// Computes blend-aware per-segment timing for a waypoint path.
pub struct PathPlanner<const N: usize> {
    path: Vec<AxesI32<N>>,
    max_velocity: AxesF<N>,
    max_acceleration: AxesF<N>,
    durations: Vec<f32>,
    blend_durations: Vec<f32>,
    velocities: Vec<AxesF<N>>,
    accelerations: Vec<AxesF<N>>,
}

impl<const N: usize> PathPlanner<N> {
    pub fn new(path: Vec<AxesI32<N>>, max_velocity: AxesF<N>, max_acceleration: AxesF<N>) -> Self {
        Self {
            path,
            max_velocity,
            max_acceleration,
            durations: Vec::new(),
            blend_durations: Vec::new(),
            velocities: Vec::new(),
            accelerations: Vec::new(),
        }
    }

    pub fn path(&self) -> &[AxesI32<N>] {
        &self.path
    }

    pub fn durations(&self) -> &[f32] {
        &self.durations
    }

    pub fn blend_durations(&self) -> &[f32] {
        &self.blend_durations
    }

    /// `durations()`, ceiled to whole ticks. This is what a
    /// [`crate::trajectory::TrajectoryCompiler`] must be built from: every
    /// downstream slope is computed from an already-integer tick count, not
    /// from this raw float.
    pub fn durations_ticks(&self) -> Vec<i32> {
        ceil_to_ticks(&self.durations)
    }

    /// `blend_durations()`, ceiled to whole ticks.
    pub fn blend_durations_ticks(&self) -> Vec<i32> {
        ceil_to_ticks(&self.blend_durations)
    }

    /// Repeatedly collapses adjacent waypoints that are within `threshold`
    /// of each other on every axis. Interior collisions are resolved by
    /// averaging the pair; the first and last waypoints are never removed.
    pub fn remove_close_waypoints(&mut self, threshold: AxesI32<N>) {
        loop {
            let mut removed_any = false;
            let mut i = 0;
            while i + 1 < self.path.len() {
                let close = (0..N).all(|a| {
                    (self.path[i][a] - self.path[i + 1][a]).unsigned_abs() <= threshold[a] as u32
                });
                if !close {
                    i += 1;
                    continue;
                }
                removed_any = true;
                if i == 0 {
                    self.path.remove(i + 1);
                } else if i + 2 == self.path.len() {
                    self.path.remove(i);
                } else {
                    let averaged = crate::axes::Axes::from_fn(|a| {
                        (self.path[i][a] + self.path[i + 1][a]) / 2
                    });
                    self.path[i] = averaged;
                    self.path.remove(i + 1);
                    i += 1;
                }
            }
            if !removed_any {
                break;
            }
        }
    }

    /// Runs the full timing computation: initial linear durations and
    /// velocities, then blend durations, then the slow-down pass.
    pub fn update(&mut self) -> Result<(), PlanError> {
        if self.path.len() < 2 {
            return Err(PlanError::EmptyPath);
        }
        if !self.max_velocity.all_positive() || !self.max_acceleration.all_positive() {
            return Err(PlanError::NonPositiveLimit);
        }
        self.resize_to_path();
        self.compute_linear_durations_and_velocities();
        self.apply_slow_down();
        Ok(())
    }

    fn resize_to_path(&mut self) {
        let n = self.path.len();
        self.durations = alloc_vec(n.saturating_sub(1), 0.0);
        self.velocities = alloc_vec(n.saturating_sub(1), AxesF::zero());
        self.blend_durations = alloc_vec(n, 0.0);
        self.accelerations = alloc_vec(n, AxesF::zero());
    }

    fn compute_linear_durations_and_velocities(&mut self) {
        for i in 0..self.path.len() - 1 {
            let delta = self.path[i + 1] - self.path[i];
            let dt = delta
                .abs()
                .cast_f32()
                .zip_with(self.max_velocity, |d, vmax| d / vmax)
                .max_component()
                .max(EPSILON);
            self.durations[i] = dt;
            self.velocities[i] = delta.cast_f32() / dt;
        }
    }

    fn velocity_before(&self, i: usize) -> AxesF<N> {
        if i == 0 {
            AxesF::zero()
        } else {
            self.velocities[i - 1]
        }
    }

    fn velocity_after(&self, i: usize) -> AxesF<N> {
        if i == self.velocities.len() {
            AxesF::zero()
        } else {
            self.velocities[i]
        }
    }

    fn recompute_blends(&mut self) {
        for i in 0..self.blend_durations.len() {
            let prev = self.velocity_before(i);
            let next = self.velocity_after(i);
            let tb = (next - prev)
                .abs()
                .zip_with(self.max_acceleration, |dv, amax| dv / amax)
                .max_component()
                .max(EPSILON);
            self.blend_durations[i] = tb;
            self.accelerations[i] = (next - prev) / tb;
        }
    }

    /// The slow-down loop of the Kunz & Stilman method: shrink the velocity
    /// on either side of any blend that would eat more than half of an
    /// adjacent linear region, then recompute every blend and repeat. The
    /// loop tolerates exactly one residual conflict before it stops, which
    /// is what lets it converge in a bounded number of iterations rather
    /// than chasing a single stubborn blend forever.
    fn apply_slow_down(&mut self) {
        self.recompute_blends();
        loop {
            let mut conflicts = 0usize;
            let mut slow_down = alloc_vec(self.blend_durations.len(), 1.0f32);

            for i in 0..self.blend_durations.len() {
                let tb = self.blend_durations[i];
                let conflicts_left = i > 0 && {
                    let dt_prev = self.durations[i - 1];
                    let tb_prev = self.blend_durations[i - 1];
                    tb > dt_prev + EPSILON && tb_prev + tb > 2.0 * dt_prev + EPSILON
                };
                let conflicts_right = i < self.durations.len() && {
                    let dt_next = self.durations[i];
                    let tb_next = self.blend_durations[i + 1];
                    tb > dt_next + EPSILON && tb + tb_next > 2.0 * dt_next + EPSILON
                };
                if conflicts_left || conflicts_right {
                    conflicts += 1;
                    let mut neighbours = Vec::new();
                    if i > 0 {
                        neighbours.push(self.durations[i - 1]);
                    }
                    if i < self.durations.len() {
                        neighbours.push(self.durations[i]);
                    }
                    let min_dt = neighbours.into_iter().fold(f32::MAX, f32::min);
                    slow_down[i] = sqrt_f32(min_dt / tb);
                }
            }

            for i in 0..self.durations.len() {
                let factor = slow_down[i].min(slow_down[i + 1]);
                self.velocities[i] = self.velocities[i] * factor;
                self.durations[i] /= factor;
            }
            self.recompute_blends();

            if conflicts <= 1 {
                break;
            }
        }
    }
}

/// Ceils every raw duration to a whole tick count, matching the reference
/// generator's own `durations()`/`blendDurations()` accessors.
fn ceil_to_ticks(raw: &[f32]) -> Vec<i32> {
    raw.iter().map(|x| ceil_f32(*x) as i32).collect()
}

fn ceil_f32(x: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        x.ceil()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::ceilf(x)
    }
}

fn alloc_vec<T: Clone>(n: usize, value: T) -> Vec<T> {
    let mut v = Vec::with_capacity(n);
    for _ in 0..n {
        v.push(value.clone());
    }
    v
}

fn sqrt_f32(x: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        x.sqrt()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::sqrtf(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axes::Axes;

    #[test]
    fn single_segment_path_has_no_conflict() {
        let path = vec![Axes([0]), Axes([100])];
        let mut p = PathPlanner::<1>::new(path, Axes([1.0]), Axes([0.1]));
        p.update().unwrap();
        assert_eq!(p.durations().len(), 1);
        assert_eq!(p.blend_durations().len(), 2);
    }

    #[test]
    fn remove_close_waypoints_keeps_endpoints() {
        let path = vec![Axes([0]), Axes([1]), Axes([2]), Axes([100])];
        let mut p = PathPlanner::<1>::new(path, Axes([1.0]), Axes([0.1]));
        p.remove_close_waypoints(Axes([1]));
        assert_eq!(p.path().first().unwrap().0, [0]);
        assert_eq!(p.path().last().unwrap().0, [100]);
        assert!(p.path().len() < 4);
    }

    #[test]
    fn blend_slow_down_converges() {
        // Waypoints that force a conflicting blend at the middle vertex.
        let path = vec![Axes([0, 0]), Axes([10, -10]), Axes([0, 0])];
        let mut p = PathPlanner::<2>::new(path, Axes([0.4, 0.4]), Axes([0.003, 0.003]));
        p.update().unwrap();
        // With no line segments left, blend durations should equal the
        // (slowed) linear durations on both sides of the middle vertex.
        assert!((p.blend_durations()[1] - p.durations()[0]).abs() < 1.0
            || (p.blend_durations()[1] - p.durations()[1]).abs() < 1.0);
    }

    #[test]
    fn rejects_too_short_path() {
        let path = vec![Axes([0])];
        let mut p = PathPlanner::<1>::new(path, Axes([1.0]), Axes([0.1]));
        assert_eq!(p.update(), Err(PlanError::EmptyPath));
    }
}
