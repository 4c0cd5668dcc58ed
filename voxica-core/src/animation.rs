//! Preloaded animation images
//!
//! An animation ships as one contiguous byte image, typically baked into
//! flash next to the firmware:
//!
//! ```text
//! ┌───────────┬───────────────┬──────────────┬─────────────┬──────────
//! │ cube_side │ channel_count │ channel_size │ frame_count │ records…
//! │ 1B        │ 1B            │ 1B           │ u16 LE      │
//! └───────────┴───────────────┴──────────────┴─────────────┴──────────
//! record: f32 LE duration (ms) + packed frame payload
//! ```
//!
//! [`AnimationImage`] is a zero-copy view: parsing checks the header and
//! the total length once, after which per-frame accessors hand out borrowed
//! slices. Frame *payload* bytes are not validated (a voxel pattern is a
//! voxel pattern), but a structurally truncated image is rejected up front.

use voxica_protocol::wire;

use crate::codec::VoxelFrame;
use crate::geometry::{GeometryDescriptor, GeometryError};

/// Image header length: geometry triple + u16 frame count
pub const HEADER_LEN: usize = 5;

/// Per-record duration prefix length (f32 LE, milliseconds)
const DURATION_LEN: usize = 4;

/// Errors from animation image parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationError {
    /// Image shorter than the fixed header
    HeaderTruncated,
    /// Header promises more frame records than the image holds
    DataTruncated,
    /// Zero frames
    NoFrames,
    /// Header geometry out of range
    InvalidGeometry(GeometryError),
}

/// Zero-copy view of a preloaded animation image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationImage<'a> {
    geometry: GeometryDescriptor,
    frame_count: u16,
    record_len: usize,
    data: &'a [u8],
}

impl<'a> AnimationImage<'a> {
    /// Parse and structurally validate an animation image
    pub fn parse(data: &'a [u8]) -> Result<Self, AnimationError> {
        if data.len() < HEADER_LEN {
            return Err(AnimationError::HeaderTruncated);
        }

        let geometry = GeometryDescriptor::new(data[0], data[1], data[2])
            .map_err(AnimationError::InvalidGeometry)?;
        let frame_count = wire::read_u16_le(data, 3).ok_or(AnimationError::HeaderTruncated)?;
        if frame_count == 0 {
            return Err(AnimationError::NoFrames);
        }

        let record_len = DURATION_LEN + geometry.frame_len();
        let needed = HEADER_LEN + frame_count as usize * record_len;
        if data.len() < needed {
            return Err(AnimationError::DataTruncated);
        }

        Ok(Self {
            geometry,
            frame_count,
            record_len,
            data,
        })
    }

    /// Geometry declared by the image header
    pub fn geometry(&self) -> GeometryDescriptor {
        self.geometry
    }

    /// Number of frames in the animation
    pub fn frame_count(&self) -> u16 {
        self.frame_count
    }

    fn record_offset(&self, index: u16) -> usize {
        HEADER_LEN + (index % self.frame_count) as usize * self.record_len
    }

    /// Display duration of a frame in milliseconds
    ///
    /// The index wraps modulo the frame count.
    pub fn duration_ms(&self, index: u16) -> f32 {
        wire::read_f32_le(self.data, self.record_offset(index)).unwrap_or(0.0)
    }

    /// Packed voxel view of a frame's payload
    ///
    /// The index wraps modulo the frame count.
    pub fn frame(&self, index: u16) -> VoxelFrame<'a> {
        let start = self.record_offset(index) + DURATION_LEN;
        let end = start + self.geometry.frame_len();
        // In range for every wrapped index: parse checked the full extent
        let payload = self.data.get(start..end).unwrap_or(&[]);
        VoxelFrame::new(self.geometry, payload)
    }
}
