//! Board-agnostic core logic for the Voxica cube firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Voxel geometry and the bit-packed frame codec
//! - Animation image parsing (zero-copy frame views)
//! - Playback engine (preloaded animation scheduling)
//! - Streaming engine (serial protocol state machine, double buffering)
//! - Driver trait for the physical plane-refresh callback

#![no_std]
#![deny(unsafe_code)]

pub mod animation;
pub mod codec;
pub mod config;
pub mod geometry;
pub mod playback;
pub mod stream;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;
