//! A small recursive-descent parser for one line of motion commands at a
//! time. There is no persistent parser state between lines: every call
//! scans a complete `&str` against the interpreter's configured axis
//! letters and dispatches straight into the interpreter's handlers, the
//! way a one-line-at-a-time protocol is meant to be driven.

#[cfg(feature = "std")]
use std::format;
#[cfg(not(feature = "std"))]
use alloc::format;

use crate::capability::Printer;
use crate::command::DistanceMode;
use crate::error::ParseError;
use crate::gcode::interpreter::Interpreter;

/// Stateless recursive-descent line parser.
pub struct Parser;

impl Parser {
    /// Parses and dispatches a single line. Parse errors are reported
    /// through `printer` and clear the interpreter's pending command
    /// buffer before being returned, mirroring how a malformed line should
    /// never leave a half-built move queued behind it.
    pub fn parse_line<const N: usize>(
        interp: &mut Interpreter<N>,
        printer: &mut impl Printer,
        line: &str,
    ) -> Result<(), ParseError> {
        let bytes = line.as_bytes();
        let mut pos = 0usize;
        let axis_names = *interp.axis_names();

        match Self::line(interp, bytes, &mut pos, &axis_names) {
            Ok(()) => Ok(()),
            Err(e) => {
                interp.clear_commands_buffer();
                printer.print_str(&format!(
                    "Error: {} at {} in {}\n",
                    e.reason(),
                    e.offset(),
                    line
                ));
                Err(e)
            }
        }
    }

    fn line<const N: usize>(
        interp: &mut Interpreter<N>,
        bytes: &[u8],
        pos: &mut usize,
        axis_names: &[char; N],
    ) -> Result<(), ParseError> {
        skip_spaces(bytes, pos);
        match peek(bytes, *pos) {
            None => Ok(()),
            Some(b'~') => {
                *pos += 1;
                interp.request_start();
                Self::expect_end(bytes, pos)
            }
            Some(b'!') => {
                *pos += 1;
                interp.request_stop();
                Self::expect_end(bytes, pos)
            }
            Some(b'^') => {
                *pos += 1;
                interp.clear_commands_buffer();
                Self::expect_end(bytes, pos)
            }
            Some(b'?') => {
                *pos += 1;
                interp.request_position_report();
                Self::expect_end(bytes, pos)
            }
            Some(b'G') => {
                *pos += 1;
                Self::g_command(interp, bytes, pos, axis_names)
            }
            Some(b'M') => {
                *pos += 1;
                Self::m_command(interp, bytes, pos, axis_names)
            }
            Some(c) if axis_names.contains(&(c as char)) => {
                let (axes, _feed) = parse_axes(bytes, pos, axis_names)?;
                interp.append_move(axes);
                Self::expect_end(bytes, pos)
            }
            Some(_) => Err(ParseError::UnexpectedSymbol { offset: *pos }),
        }
    }

    fn g_command<const N: usize>(
        interp: &mut Interpreter<N>,
        bytes: &[u8],
        pos: &mut usize,
        axis_names: &[char; N],
    ) -> Result<(), ParseError> {
        let number = parse_uint(bytes, pos).ok_or(ParseError::MissingNumber { offset: *pos })?;
        skip_spaces(bytes, pos);
        match number {
            0 => {
                let (axes, _feed) = parse_axes(bytes, pos, axis_names)?;
                interp.append_move(axes);
            }
            1 => {
                let (axes, feed) = parse_axes(bytes, pos, axis_names)?;
                if let Some(f) = feed {
                    interp.feedrate_override(f);
                }
                interp.append_move(axes);
            }
            4 => {
                if peek(bytes, *pos) != Some(b'P') {
                    return Err(ParseError::UnexpectedSymbol { offset: *pos });
                }
                *pos += 1;
                let seconds =
                    parse_float(bytes, pos).ok_or(ParseError::MissingNumber { offset: *pos })?;
                interp.append_wait(seconds);
            }
            28 => interp.run_homing_cycle(),
            90 => interp.set_distance_mode(DistanceMode::Absolute),
            91 => interp.set_distance_mode(DistanceMode::Relative),
            _ => return Err(ParseError::UnknownCommand { offset: *pos }),
        }
        Self::expect_end(bytes, pos)
    }

    fn m_command<const N: usize>(
        interp: &mut Interpreter<N>,
        bytes: &[u8],
        pos: &mut usize,
        axis_names: &[char; N],
    ) -> Result<(), ParseError> {
        let number = parse_uint(bytes, pos).ok_or(ParseError::MissingNumber { offset: *pos })?;
        skip_spaces(bytes, pos);
        match number {
            100 => {
                let (axes, _) = parse_axes(bytes, pos, axis_names)?;
                interp.override_max_velocity(axes);
            }
            101 => {
                let (axes, _) = parse_axes(bytes, pos, axis_names)?;
                interp.override_max_acceleration(axes);
            }
            102 => {
                let (axes, _) = parse_axes(bytes, pos, axis_names)?;
                interp.override_steps_per_unit(axes);
            }
            103 => {
                let (axes, _) = parse_axes(bytes, pos, axis_names)?;
                interp.override_homing_velocity(axes);
            }
            104 => interp.request_info_report(),
            105 => {
                let (axes, _) = parse_axes(bytes, pos, axis_names)?;
                interp.override_min_position(axes);
            }
            106 => {
                let (axes, _) = parse_axes(bytes, pos, axis_names)?;
                interp.override_max_position(axes);
            }
            110 => interp.request_axes_report(),
            _ => return Err(ParseError::UnknownCommand { offset: *pos }),
        }
        Self::expect_end(bytes, pos)
    }

    fn expect_end(bytes: &[u8], pos: &mut usize) -> Result<(), ParseError> {
        skip_spaces(bytes, pos);
        match peek(bytes, *pos) {
            None => Ok(()),
            Some(b'\n') => {
                *pos += 1;
                Ok(())
            }
            Some(_) => Err(ParseError::MissingNewline { offset: *pos }),
        }
    }
}

fn peek(bytes: &[u8], pos: usize) -> Option<u8> {
    bytes.get(pos).copied()
}

fn skip_spaces(bytes: &[u8], pos: &mut usize) {
    while matches!(peek(bytes, *pos), Some(b' ') | Some(b'\t') | Some(b'\r')) {
        *pos += 1;
    }
}

fn parse_uint(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let start = *pos;
    while matches!(peek(bytes, *pos), Some(c) if c.is_ascii_digit()) {
        *pos += 1;
    }
    if *pos == start {
        return None;
    }
    core::str::from_utf8(&bytes[start..*pos]).ok()?.parse().ok()
}

fn parse_float(bytes: &[u8], pos: &mut usize) -> Option<f32> {
    let start = *pos;
    if matches!(peek(bytes, *pos), Some(b'-') | Some(b'+')) {
        *pos += 1;
    }
    let mut saw_digit = false;
    while matches!(peek(bytes, *pos), Some(c) if c.is_ascii_digit()) {
        *pos += 1;
        saw_digit = true;
    }
    if peek(bytes, *pos) == Some(b'.') {
        *pos += 1;
        while matches!(peek(bytes, *pos), Some(c) if c.is_ascii_digit()) {
            *pos += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        *pos = start;
        return None;
    }
    core::str::from_utf8(&bytes[start..*pos]).ok()?.parse().ok()
}

/// Parses zero or more `<axis letter><float>` pairs, plus an optional
/// trailing `F<float>` feedrate, stopping at the first byte that is
/// neither an axis letter nor `F`. Unset axes carry `+infinity`, the
/// "this axis was not in the command" sentinel used throughout the crate.
fn parse_axes<const N: usize>(
    bytes: &[u8],
    pos: &mut usize,
    axis_names: &[char; N],
) -> Result<(crate::axes::AxesF<N>, Option<f32>), ParseError> {
    let mut axes = crate::axes::AxesF::<N>::splat(f32::INFINITY);
    let mut feed = None;
    loop {
        skip_spaces(bytes, pos);
        let c = match peek(bytes, *pos) {
            Some(c) => c as char,
            None => break,
        };
        if c == 'F' {
            *pos += 1;
            let v = parse_float(bytes, pos).ok_or(ParseError::MissingNumber { offset: *pos })?;
            feed = Some(v);
            continue;
        }
        if let Some(idx) = axis_names.iter().position(|&a| a == c) {
            *pos += 1;
            let v = parse_float(bytes, pos).ok_or(ParseError::MissingNumber { offset: *pos })?;
            axes[idx] = v;
            continue;
        }
        break;
    }
    Ok((axes, feed))
}
