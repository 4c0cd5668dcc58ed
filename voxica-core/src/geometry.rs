//! Cube geometry and bit layout
//!
//! A frame packs one value per (voxel, channel) into a flat byte buffer.
//! Voxels are ordered z-major (`index = z·side² + y·side + x`); within a
//! voxel, channels are consecutive. Channel widths are restricted to
//! divisors of 8, so a channel's bits never straddle a byte boundary.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest supported cube side
pub const MAX_CUBE_SIDE: u8 = 8;

/// Largest supported channel count
pub const MAX_CHANNEL_COUNT: u8 = 3;

/// Largest packed frame, in bytes (8³ voxels × 3 channels × 8 bits)
pub const MAX_FRAME_LEN: usize =
    MAX_CUBE_SIDE as usize * MAX_CUBE_SIDE as usize * MAX_CUBE_SIDE as usize
        * MAX_CHANNEL_COUNT as usize;

/// Errors from validated geometry construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Cube side outside `1..=8`
    CubeSideOutOfRange,
    /// Channel count outside `1..=3`
    ChannelCountOutOfRange,
    /// Channel size not one of 1, 2, 4, 8 bits
    InvalidChannelSize,
}

/// One addressable cube cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Voxel {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl Voxel {
    /// Create a voxel coordinate
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// Cube display geometry
///
/// Constructed through [`GeometryDescriptor::new`] (validated) or
/// [`GeometryDescriptor::sanitize`] (clamping); every value of this type
/// satisfies the documented field ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryDescriptor {
    cube_side: u8,
    channel_count: u8,
    channel_size: u8,
}

impl GeometryDescriptor {
    /// Create a validated geometry
    pub fn new(cube_side: u8, channel_count: u8, channel_size: u8) -> Result<Self, GeometryError> {
        if cube_side == 0 || cube_side > MAX_CUBE_SIDE {
            return Err(GeometryError::CubeSideOutOfRange);
        }
        if channel_count == 0 || channel_count > MAX_CHANNEL_COUNT {
            return Err(GeometryError::ChannelCountOutOfRange);
        }
        if !matches!(channel_size, 1 | 2 | 4 | 8) {
            return Err(GeometryError::InvalidChannelSize);
        }

        Ok(Self {
            cube_side,
            channel_count,
            channel_size,
        })
    }

    /// Create a geometry from untrusted values by clamping
    ///
    /// Cube side and channel count are clamped into range; an invalid
    /// channel size falls back to 1 bit. This mirrors how the streaming
    /// front end accepts whatever the build-time configuration holds.
    pub fn sanitize(cube_side: u8, channel_count: u8, channel_size: u8) -> Self {
        let channel_size = if matches!(channel_size, 1 | 2 | 4 | 8) {
            channel_size
        } else {
            1
        };

        Self {
            cube_side: cube_side.clamp(1, MAX_CUBE_SIDE),
            channel_count: channel_count.clamp(1, MAX_CHANNEL_COUNT),
            channel_size,
        }
    }

    /// Edge length of the cube
    pub fn cube_side(&self) -> u8 {
        self.cube_side
    }

    /// Channels per voxel
    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Bits per channel
    pub fn channel_size(&self) -> u8 {
        self.channel_size
    }

    /// Largest raw channel value (`2^channel_size − 1`)
    pub fn channel_max(&self) -> u8 {
        (((1u16) << self.channel_size) - 1) as u8
    }

    /// Total number of voxels
    pub fn voxel_count(&self) -> usize {
        let side = self.cube_side as usize;
        side * side * side
    }

    /// Packed frame length in bytes
    pub fn frame_len(&self) -> usize {
        let bits = self.voxel_count() * self.channel_count as usize * self.channel_size as usize;
        bits.div_ceil(8)
    }

    /// Whether a coordinate lies inside the cube
    pub fn contains(&self, voxel: Voxel) -> bool {
        voxel.x < self.cube_side && voxel.y < self.cube_side && voxel.z < self.cube_side
    }

    /// Linear voxel index, z-major
    pub fn voxel_index(&self, voxel: Voxel) -> usize {
        let side = self.cube_side as usize;
        side * side * voxel.z as usize + side * voxel.y as usize + voxel.x as usize
    }

    /// Bit offset of a (voxel, channel) value inside the packed frame
    pub fn bit_offset(&self, voxel: Voxel, channel: u8) -> usize {
        self.voxel_index(voxel) * self.channel_count as usize * self.channel_size as usize
            + channel as usize * self.channel_size as usize
    }
}
