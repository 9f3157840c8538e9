//! The interpreter's buffered command representation.

use crate::axes::AxesF;

/// Absolute vs. relative interpretation of a `Move`'s target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMode {
    Absolute,
    Relative,
}

/// One buffered interpreter command, appended by `G`/`M` handlers and
/// consumed by the planning pipeline on `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Command<const N: usize> {
    /// A linear move. Axes holding `+infinity` in `target_pos` are unchanged.
    Move {
        target_pos: AxesF<N>,
        max_vel: AxesF<N>,
        max_acc: AxesF<N>,
        mode: DistanceMode,
    },
    /// A pause. `seconds < 0` is skipped entirely during planning; `0` is a no-op.
    Wait { seconds: f32 },
    /// A homing cycle. An axis with `velocity == 0` is excluded from homing.
    Homing { velocity: AxesF<N> },
}
