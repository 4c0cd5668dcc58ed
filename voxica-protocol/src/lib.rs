//! Voxica Serial Streaming Protocol
//!
//! This crate defines the byte-oriented protocol between a host (frame
//! source) and the cube device. The device drives the conversation: after a
//! three-way handshake it polls the host for frame data, which arrives in
//! 8-byte raw or run-length-encoded chunks and is published with an explicit
//! display request.
//!
//! # Protocol Overview
//!
//! ```text
//! host → device    INIT_REQUEST
//! device → host    INIT_START, cube_side, channel_count, channel_size
//! host → device    INIT_ACKNOWLEDGE
//!
//! repeated:
//! device → host    STREAM_REQUEST
//! host → device    COMPRESSED_START | RAW_START   + 8 bytes, STREAM_END, checksum
//!                  └ device → host  STREAM_ACK | STREAM_CORRUPTED
//! host → device    DISPLAY
//!                  └ device → host  FRAME_DISPLAYED | FRAME_FAILED
//!
//! device → host    TERMINATE
//! ```
//!
//! All opcodes are single bytes; multi-byte scalars anywhere in the system
//! (animation headers, frame durations) use the little-endian codecs in
//! [`wire`].

#![no_std]
#![deny(unsafe_code)]

pub mod packets;
pub mod wire;

pub use packets::{DisplayVerdict, RunPair, StreamCommand, StreamVerdict, CHUNK_LEN};
