//! Preloaded animation playback
//!
//! The engine interleaves two clock domains on one thread: a fixed-period
//! refresh tick at the plane rate, and a content-driven frame-advance
//! deadline read from each frame's duration field. Neither waits on an OS
//! primitive; every iteration sleeps out its own residual.

use core::convert::Infallible;

use voxica_hal::{DelayUs, MonotonicClock, TimeSource};

use crate::animation::AnimationImage;
use crate::codec::VoxelFrame;
use crate::config::{self, ConfigError};
use crate::geometry::Voxel;
use crate::traits::{PlaneDriver, Tick};

/// Playback engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// Constructed, not yet started
    Idle,
    /// Scheduling loop active
    Running,
    /// Stopped; the refresh callback keeps firing forever
    Terminated,
}

/// Animation playback engine
///
/// [`start`](Self::start) permanently takes ownership of the thread of
/// control: on success it never returns. After a terminate directive the
/// engine stays in [`PlaybackState::Terminated`], where its sole behavior
/// is to keep invoking the plane driver: a deliberate terminal state, not
/// unreachable code.
pub struct PlaybackEngine<'a> {
    image: AnimationImage<'a>,
    plane_rate: u16,
    tick_period_us: u64,
    state: PlaybackState,
    /// Frame whose payload the decode queries currently answer over
    view_frame: u16,
    /// Frame the next deadline expiry advances to
    next_frame: u16,
    /// Absolute deadline; starts at 0 so the first iteration advances
    frame_deadline_us: u64,
}

impl<'a> PlaybackEngine<'a> {
    /// Create an engine over a parsed animation image
    ///
    /// Geometry and structural validation happen in
    /// [`AnimationImage::parse`]; frame payload bytes are the caller's
    /// responsibility.
    pub fn new(image: AnimationImage<'a>, plane_rate: u16) -> Self {
        Self {
            image,
            plane_rate,
            tick_period_us: 0,
            state: PlaybackState::Idle,
            view_frame: 0,
            next_frame: 0,
            frame_deadline_us: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// View of the frame currently being displayed
    pub fn frame(&self) -> VoxelFrame<'a> {
        self.image.frame(self.view_frame)
    }

    /// Brightness (0–255) of one channel of one voxel
    pub fn channel_brightness(&self, channel: u8, voxel: Voxel) -> u8 {
        self.frame().channel_brightness(channel, voxel)
    }

    /// Brightness of a single-channel voxel
    pub fn voxel_brightness(&self, voxel: Voxel) -> u8 {
        self.frame().voxel_brightness(voxel)
    }

    /// On/off state of one channel of one voxel
    pub fn channel_state(&self, channel: u8, voxel: Voxel) -> bool {
        self.frame().channel_state(channel, voxel)
    }

    /// On/off state of a single-channel voxel
    pub fn voxel_state(&self, voxel: Voxel) -> bool {
        self.frame().voxel_state(voxel)
    }

    /// Request termination at the next iteration boundary
    pub fn terminate(&mut self) {
        self.state = PlaybackState::Terminated;
    }

    fn configure_timing(&mut self) -> Result<(), ConfigError> {
        self.tick_period_us = config::tick_period_us(self.plane_rate)?;
        Ok(())
    }

    /// Run the playback loop
    ///
    /// Fails fast with [`ConfigError`] before the first iteration;
    /// afterwards it never returns.
    pub fn start<T, P>(&mut self, time: &mut T, plane: &mut P) -> Result<Infallible, ConfigError>
    where
        T: TimeSource,
        P: PlaneDriver,
    {
        self.configure_timing()?;
        self.state = PlaybackState::Running;

        while self.state == PlaybackState::Running {
            self.step(time, plane);
        }

        // Terminal state: nothing after the scheduling loop may run, but
        // the physical refresh keeps firing for the rest of program life.
        loop {
            let frame = self.frame();
            plane.refresh(&frame);
        }
    }

    /// One scheduling iteration: frame advance, residual sleep, tick
    fn step<T, P>(&mut self, time: &mut T, plane: &mut P)
    where
        T: MonotonicClock + DelayUs,
        P: PlaneDriver,
    {
        let iteration_start = time.now_us();

        if time.now_us() > self.frame_deadline_us {
            let duration_ms = self.image.duration_ms(self.next_frame);
            self.frame_deadline_us = time.now_us() + (duration_ms * 1000.0) as u64;
            self.view_frame = self.next_frame;
            self.next_frame = (self.next_frame + 1) % self.image.frame_count();
        }

        let elapsed = time.now_us().saturating_sub(iteration_start);
        time.delay_us(self.tick_period_us.saturating_sub(elapsed));

        let frame = self.image.frame(self.view_frame);
        if plane.refresh(&frame) == Tick::Terminate {
            self.terminate();
        }
    }
}
