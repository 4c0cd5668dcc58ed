//! Microsecond timekeeping abstractions
//!
//! The engines interleave two clock domains on one thread and never block
//! on an OS primitive; all they need from the platform is a monotonic
//! microsecond counter and a busy-wait delay.

/// Monotonic microsecond counter
///
/// The timeline is a `u64`, so implementations wrapping a 32-bit hardware
/// counter must extend it; at microsecond resolution a `u64` does not wrap
/// for any realistic uptime.
pub trait MonotonicClock {
    /// Current time in microseconds since an arbitrary epoch
    ///
    /// Takes `&mut self` because reading a timer peripheral typically
    /// requires mutable access.
    fn now_us(&mut self) -> u64;
}

/// Microsecond-resolution busy-wait delay
pub trait DelayUs {
    /// Busy-wait for the given number of microseconds
    fn delay_us(&mut self, us: u64);
}

/// Combined time source
///
/// For platforms where the same peripheral provides both the counter and
/// the delay loop.
pub trait TimeSource: MonotonicClock + DelayUs {}

// Blanket implementation
impl<T: MonotonicClock + DelayUs> TimeSource for T {}
