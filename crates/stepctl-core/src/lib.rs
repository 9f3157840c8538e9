#![deny(clippy::all)]
#![cfg_attr(not(feature = "std"), no_std)]

//! # Stepper Motion Core
//!
//! A deterministic trajectory planner and real-time step generator for
//! multi-axis stepper motor rigs, usable on both host and MCU
//! (`no_std`-friendly).
//!
//! The pipeline, leaves first:
//!
//! ```text
//! text line -> Parser -> Interpreter -> Command list
//!                                     |
//!                                     v
//!                           PathPlanner (v/a, blends)
//!                                     |
//!                                     v
//!                       TrajectoryCompiler (-> Segments[])
//!                                     |
//!                                     v
//!                           SegmentExecutor <- Ticker (periodic)
//!                                     |
//!                                     v
//!                                   Motor
//! ```
//!
//! `Parser` and `Interpreter` live in [`gcode`]. `PathPlanner` lives in
//! [`planner`], `TrajectoryCompiler` in [`trajectory`], and the real-time
//! tick loop in [`executor`]. The `Motor`, `Ticker` and `Printer`
//! capabilities a board must provide are defined in [`capability`].

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod axes;
pub mod capability;
pub mod command;
pub mod error;
pub mod executor;
pub mod gcode;
pub mod planner;
pub mod segment;
pub mod trajectory;

pub use axes::{AxesF, AxesI32, AxesI64};
pub use capability::{Motor, Printer, Ticker};
pub use command::{Command, DistanceMode};
pub use error::{ParseError, PlanError};
pub use executor::SegmentExecutor;
pub use gcode::{Interpreter, Parser};
pub use segment::Segment;
