//! The Bresenham-integrator's atomic unit of motion.
//!
//! A `Segment` precomputes everything the tick loop needs so that
//! [`crate::executor::SegmentExecutor`] never does anything but integer
//! add/compare/shift per axis per tick. Four constructors build the four
//! shapes a segment can take; each one front-loads a set of `debug_assert!`
//! invariant checks so a malformed segment never reaches the tick path in a
//! debug build, while a release build drops the checks entirely.

use crate::axes::{AxesI32, AxesI64};

/// A precomputed linear, parabolic, wait, or homing motion segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment<const N: usize> {
    /// Remaining ticks. Negative encodes a homing segment; `0` means
    /// "advance to the next segment".
    pub dt: i32,
    /// Bresenham denominator, shared by all axes.
    pub denominator: i64,
    /// Per-axis velocity numerator (units: 2*steps per segment duration).
    pub velocity: AxesI64<N>,
    /// Per-axis twice-acceleration (units: steps/tick^2).
    pub acceleration: AxesI32<N>,
    /// Per-axis running Bresenham residual.
    pub error: AxesI64<N>,
}

impl<const N: usize> Segment<N> {
    /// A constant-velocity segment of `dt` ticks moving `dx` steps per axis.
    pub fn linear(dt: i32, dx: AxesI32<N>) -> Self {
        debug_assert!(dt > 0, "linear segment duration must be positive");
        for i in 0..N {
            debug_assert!(
                (dx[i] as i64).unsigned_abs() * 2 <= dt as u64,
                "linear displacement exceeds duration on axis {i}"
            );
        }
        let dt_l = dt as i64;
        Segment {
            dt,
            denominator: 2 * dt_l,
            velocity: dx.cast_i64() * AxesI64::splat(2),
            acceleration: AxesI32::zero(),
            error: AxesI64::zero(),
        }
    }

    /// A symmetric parabolic blend of total duration `twice_dt = 2*delta_t`,
    /// moving `dx1` steps per axis in the first half and `dx2` in the second.
    pub fn parabolic(twice_dt: i32, dx1: AxesI32<N>, dx2: AxesI32<N>) -> Self {
        debug_assert!(twice_dt > 0, "blend duration must be positive");
        for i in 0..N {
            debug_assert!(
                (dx1[i] as i64).unsigned_abs() * 4 <= twice_dt as u64,
                "first half-blend displacement exceeds duration on axis {i}"
            );
            debug_assert!(
                (dx2[i] as i64).unsigned_abs() * 4 <= twice_dt as u64,
                "second half-blend displacement exceeds duration on axis {i}"
            );
        }
        let twice_dt_l = twice_dt as i64;
        let half_accel = dx2.cast_i64() - dx1.cast_i64();
        // The half-step integration pre-offset: without it the discrete
        // integrator would under-shoot the true integral of a ramping
        // velocity by half an acceleration step over the blend.
        let velocity =
            dx1.cast_i64() * AxesI64::splat(2 * twice_dt_l) + half_accel;
        Segment {
            dt: twice_dt,
            denominator: twice_dt_l * twice_dt_l,
            velocity,
            acceleration: half_accel.map(|v| (2 * v) as i32),
            error: AxesI64::zero(),
        }
    }

    /// A stationary pause of `dt` ticks.
    pub fn wait(dt: i32) -> Self {
        debug_assert!(dt >= 0, "wait duration must not be negative");
        Segment {
            dt,
            denominator: 1,
            velocity: AxesI64::zero(),
            acceleration: AxesI32::zero(),
            error: AxesI64::zero(),
        }
    }

    /// A homing segment: run each nonzero-velocity axis until its end
    /// switch fires. `velocity` is in steps/tick, already clamped to
    /// `[-1, 1]` by the interpreter.
    ///
    /// The per-axis numerator is derived through a lossy integer
    /// reciprocal (`dt_max / round(-1/v)`) rather than a direct scaling by
    /// `v`. This mirrors the reference firmware's derivation exactly; it
    /// loses precision for small `|v|` but stays monotonic with `|v|`,
    /// which is the only property the termination test in the tick loop
    /// relies on.
    pub fn homing(velocity: crate::axes::AxesF<N>) -> Self {
        let dt_max: i64 = i32::MAX as i64;
        let mut dx = AxesI64::<N>::zero();
        for i in 0..N {
            let v = velocity[i];
            if v == 0.0 {
                dx[i] = 0;
                continue;
            }
            let recip = (-1.0f32 / v) as i64;
            debug_assert!(recip != 0, "homing velocity magnitude must not exceed 1");
            dx[i] = dt_max / recip;
        }
        for i in 0..N {
            debug_assert!(
                dx[i].unsigned_abs() * 2 <= dt_max as u64,
                "homing displacement rate exceeds i32::MAX on axis {i}"
            );
        }
        Segment {
            dt: -1,
            denominator: 2 * dt_max,
            velocity: dx * AxesI64::splat(2),
            acceleration: AxesI32::zero(),
            error: AxesI64::zero(),
        }
    }

    pub fn is_homing(&self) -> bool {
        self.dt < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axes::Axes;

    #[test]
    fn linear_segment_fields() {
        let seg = Segment::<1>::linear(10, Axes([5]));
        assert_eq!(seg.dt, 10);
        assert_eq!(seg.denominator, 20);
        assert_eq!(seg.velocity.0, [10]);
        assert_eq!(seg.acceleration.0, [0]);
    }

    #[test]
    fn parabolic_segment_fields() {
        let seg = Segment::<1>::parabolic(4, Axes([1]), Axes([1]));
        assert_eq!(seg.dt, 4);
        assert_eq!(seg.denominator, 16);
        // dx1 == dx2 so half_accel == 0, velocity == 2*twice_dt*dx1.
        assert_eq!(seg.velocity.0, [8]);
        assert_eq!(seg.acceleration.0, [0]);
    }

    #[test]
    fn wait_segment_is_stationary() {
        let seg = Segment::<2>::wait(7);
        assert_eq!(seg.velocity.0, [0, 0]);
        assert_eq!(seg.denominator, 1);
    }

    #[test]
    fn homing_segment_is_negative_dt() {
        let seg = Segment::<2>::homing(Axes([0.5, 0.0]));
        assert!(seg.is_homing());
        assert_ne!(seg.velocity[0], 0);
        assert_eq!(seg.velocity[1], 0);
    }

    #[test]
    fn homing_velocity_monotonic_with_magnitude() {
        let slow = Segment::<1>::homing(Axes([0.1]));
        let fast = Segment::<1>::homing(Axes([0.9]));
        assert!(slow.velocity[0].abs() < fast.velocity[0].abs());
    }
}
