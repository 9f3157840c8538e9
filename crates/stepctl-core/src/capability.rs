//! Capabilities the board layer must provide. These are the seams between
//! this crate's real-time core and whatever actually toggles GPIO pins,
//! owns a hardware timer, or prints to a console — board wiring is
//! explicitly outside this crate.

/// Step/direction output and end-switch input for one axis group.
///
/// All operations are expected to be wait-free: they run inside the tick
/// handler, which must complete well within one tick period.
pub trait Motor<const N: usize> {
    /// Drives the step line for `axis` high or low.
    fn write_step(&mut self, axis: usize, level: bool);
    /// Drives the direction line for `axis`. Sign convention is
    /// board-specific; any monotonic mapping between `dir` and physical
    /// direction is acceptable.
    fn write_direction(&mut self, axis: usize, dir: bool);
    /// Samples whether `axis`'s end switch is currently asserted.
    fn end_switch_hit(&mut self, axis: usize) -> bool;
    /// Called once at the start of a tick's integration, before any
    /// `write_step`/`write_direction` calls. Default no-op.
    fn begin(&mut self) {}
    /// Called once at the end of a tick's integration. Default no-op.
    fn end(&mut self) {}
}

/// A periodic hardware tick source.
///
/// Unlike the reference firmware this crate was modeled on, `attach_us`
/// does not take a handler closure: registering `&mut self`-capturing
/// callbacks with a hardware timer is exactly the kind of board wiring
/// this crate stays out of. Instead, `attach_us`/`detach` only arm and
/// disarm the timer; whatever owns both the timer and the
/// `SegmentExecutor` is responsible for calling
/// [`crate::executor::SegmentExecutor::tick`] each period (from a real
/// interrupt handler on a board, or from a driving loop in a simulator).
pub trait Ticker {
    /// Arms the timer to fire every `period_us` microseconds.
    fn attach_us(&mut self, period_us: u32);
    /// Disarms the timer.
    fn detach(&mut self);
}

/// The text output sink for status and error reporting.
pub trait Printer {
    fn print_str(&mut self, s: &str);
    fn print_f32_slice(&mut self, values: &[f32]);
    fn print_i32_slice(&mut self, values: &[i32]);
}
