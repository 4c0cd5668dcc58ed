//! Bit-packed voxel frame codec
//!
//! [`VoxelFrame`] and [`VoxelFrameMut`] are zero-copy views over a packed
//! frame buffer. All reads are bounds-checked and total: an out-of-range
//! channel, coordinate, or undersized buffer yields the neutral value
//! (0 / `false`) rather than an error; decode queries are fired from the
//! refresh hot path and must never fail.

use crate::geometry::{GeometryDescriptor, Voxel};

/// Scale a raw channel value to a 0–255 brightness
///
/// `channel_max` is always one of {1, 3, 15, 255}, each of which divides
/// 255, so the integer division is exact: no rounding error, monotonic,
/// `0 → 0` and `channel_max → 255`.
pub fn brightness(raw: u8, channel_max: u8) -> u8 {
    (raw as u16 * 255 / channel_max as u16) as u8
}

/// Interpret a raw channel value as an on/off state
pub fn state(raw: u8) -> bool {
    raw != 0
}

/// Read-only view of a packed voxel frame
#[derive(Debug, Clone, Copy)]
pub struct VoxelFrame<'a> {
    geometry: GeometryDescriptor,
    data: &'a [u8],
}

impl<'a> VoxelFrame<'a> {
    /// Create a view over a packed frame buffer
    pub fn new(geometry: GeometryDescriptor, data: &'a [u8]) -> Self {
        Self { geometry, data }
    }

    /// Geometry this view decodes against
    pub fn geometry(&self) -> GeometryDescriptor {
        self.geometry
    }

    /// Underlying packed bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Extract the raw value of one channel of one voxel
    ///
    /// Returns 0 when `channel >= channel_count` or the coordinate lies
    /// outside the cube (caller-checked contract, no error raised).
    pub fn read_channel(&self, channel: u8, voxel: Voxel) -> u8 {
        if channel >= self.geometry.channel_count() || !self.geometry.contains(voxel) {
            return 0;
        }

        let offset = self.geometry.bit_offset(voxel, channel);
        let byte = match self.data.get(offset / 8) {
            Some(&byte) => byte,
            None => return 0,
        };

        // channel_size divides 8, so the value never straddles bytes
        (byte >> (offset % 8)) & self.geometry.channel_max()
    }

    /// Brightness (0–255) of one channel of one voxel
    pub fn channel_brightness(&self, channel: u8, voxel: Voxel) -> u8 {
        brightness(self.read_channel(channel, voxel), self.geometry.channel_max())
    }

    /// On/off state of one channel of one voxel
    ///
    /// Meaningful only for 1-bit channels; any other channel size yields
    /// `false`.
    pub fn channel_state(&self, channel: u8, voxel: Voxel) -> bool {
        if self.geometry.channel_size() != 1 {
            return false;
        }
        state(self.read_channel(channel, voxel))
    }

    /// Brightness of a single-channel voxel
    ///
    /// Yields 0 for multi-channel geometries; use
    /// [`channel_brightness`](Self::channel_brightness) there instead.
    pub fn voxel_brightness(&self, voxel: Voxel) -> u8 {
        if self.geometry.channel_count() != 1 {
            return 0;
        }
        self.channel_brightness(0, voxel)
    }

    /// On/off state of a single-channel voxel
    ///
    /// Yields `false` for multi-channel geometries.
    pub fn voxel_state(&self, voxel: Voxel) -> bool {
        if self.geometry.channel_count() != 1 {
            return false;
        }
        self.channel_state(0, voxel)
    }
}

/// Mutable view of a packed voxel frame
pub struct VoxelFrameMut<'a> {
    geometry: GeometryDescriptor,
    data: &'a mut [u8],
}

impl<'a> VoxelFrameMut<'a> {
    /// Create a mutable view over a packed frame buffer
    pub fn new(geometry: GeometryDescriptor, data: &'a mut [u8]) -> Self {
        Self { geometry, data }
    }

    /// Store the raw value of one channel of one voxel
    ///
    /// Out-of-range channels and coordinates are ignored; the value is
    /// masked to `channel_size` bits.
    pub fn write_channel(&mut self, channel: u8, voxel: Voxel, raw: u8) {
        if channel >= self.geometry.channel_count() || !self.geometry.contains(voxel) {
            return;
        }

        let offset = self.geometry.bit_offset(voxel, channel);
        let max = self.geometry.channel_max();
        if let Some(byte) = self.data.get_mut(offset / 8) {
            let bit = offset % 8;
            *byte = (*byte & !(max << bit)) | ((raw & max) << bit);
        }
    }

    /// Reborrow as a read-only view
    pub fn as_frame(&self) -> VoxelFrame<'_> {
        VoxelFrame::new(self.geometry, &self.data[..])
    }
}
