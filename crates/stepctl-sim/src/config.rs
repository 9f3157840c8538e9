//! TOML rig configuration: axis naming, tick rate, and the same
//! velocity/acceleration/steps-per-unit overrides the `M1xx` command
//! family applies at runtime, just loaded once at startup instead of
//! typed in.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Axis count this binary is built for. `stepctl-core` is generic over
/// the axis count via a const generic; a host binary has to pick one at
/// compile time, so this one covers the common X/Y/Z case.
pub const AXIS_COUNT: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct RigConfig {
    pub axis_names: [char; AXIS_COUNT],
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
    #[serde(default)]
    pub steps_per_unit: Option<[f32; AXIS_COUNT]>,
    #[serde(default)]
    pub max_velocity: Option<[f32; AXIS_COUNT]>,
    #[serde(default)]
    pub max_acceleration: Option<[f32; AXIS_COUNT]>,
    #[serde(default)]
    pub homing_velocity: Option<[f32; AXIS_COUNT]>,
    /// Position (in steps) at or below which an axis's end switch is
    /// considered asserted during homing. Defaults to the origin.
    #[serde(default)]
    pub home_offsets: Option<[i32; AXIS_COUNT]>,
}

fn default_ticks_per_second() -> u32 {
    1000
}

impl RigConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading rig configuration at {path:?}"))?;
        toml::from_str(&text).with_context(|| format!("parsing rig configuration at {path:?}"))
    }

    pub fn default_for_axes(axis_names: [char; AXIS_COUNT]) -> Self {
        Self {
            axis_names,
            ticks_per_second: default_ticks_per_second(),
            steps_per_unit: None,
            max_velocity: None,
            max_acceleration: None,
            homing_velocity: None,
            home_offsets: None,
        }
    }
}
