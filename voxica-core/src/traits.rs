//! Engine-facing driver traits
//!
//! The engines own the thread of control; the application hooks in through
//! these traits rather than the other way around.

use crate::codec::VoxelFrame;

/// Directive returned by the refresh callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Keep scheduling
    Continue,
    /// Stop at the next outer-loop boundary
    Terminate,
}

/// Physical plane-multiplexing driver
///
/// Called once per scheduling iteration (and during long serial waits, so
/// a slow host cannot starve the display). The callback receives the
/// currently published frame and multiplexes it onto the LED planes.
///
/// Returning [`Tick::Terminate`] is the only way to stop an engine: it is
/// sampled once per outer iteration, and in-flight protocol exchanges are
/// never preempted by it.
pub trait PlaneDriver {
    /// Refresh the physical display from the given frame
    fn refresh(&mut self, frame: &VoxelFrame<'_>) -> Tick;
}
