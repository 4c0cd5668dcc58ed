//! Packet opcodes and typed command/reply values
//!
//! Opcode values are fixed by the existing host implementations and must
//! not change.

/// Handshake: host asks the device to identify itself
pub const INIT_REQUEST: u8 = 127;
/// Handshake: device reply, followed by cube_side, channel_count, channel_size
pub const INIT_START: u8 = 120;
/// Handshake: host accepts the advertised geometry
pub const INIT_ACKNOWLEDGE: u8 = 113;

/// Device polls the host for the next exchange
pub const STREAM_REQUEST: u8 = 63;
/// Device announces end of communication
pub const TERMINATE: u8 = 0;

/// Host opens a run-length-encoded chunk
pub const COMPRESSED_START: u8 = 32;
/// Host opens a literal chunk
pub const RAW_START: u8 = 31;
/// Host requests publication of the assembled frame
pub const DISPLAY: u8 = 24;

/// Chunk terminator, followed by one checksum byte
pub const STREAM_END: u8 = 248;
/// Device accepted the chunk
pub const STREAM_ACK: u8 = 240;
/// Device rejected the chunk; host must resend it
pub const STREAM_CORRUPTED: u8 = 224;
/// Device swapped the assembled frame onto the display
pub const FRAME_DISPLAYED: u8 = 217;
/// Device had no complete frame to display; host must resend the frame
pub const FRAME_FAILED: u8 = 210;

/// Payload bytes per chunk, raw or compressed
pub const CHUNK_LEN: usize = 8;

/// Host command starting a stream exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamCommand {
    /// Run-length-encoded chunk follows
    Compressed,
    /// Literal chunk follows
    Raw,
    /// Publish the assembled frame
    Display,
}

impl StreamCommand {
    /// Parse a command from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            COMPRESSED_START => Some(StreamCommand::Compressed),
            RAW_START => Some(StreamCommand::Raw),
            DISPLAY => Some(StreamCommand::Display),
            _ => None,
        }
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            StreamCommand::Compressed => COMPRESSED_START,
            StreamCommand::Raw => RAW_START,
            StreamCommand::Display => DISPLAY,
        }
    }
}

/// Device verdict on a received chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamVerdict {
    /// Chunk accepted and committed
    Ack,
    /// Terminator mismatch; chunk dropped
    Corrupted,
}

impl StreamVerdict {
    /// Parse a verdict from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            STREAM_ACK => Some(StreamVerdict::Ack),
            STREAM_CORRUPTED => Some(StreamVerdict::Corrupted),
            _ => None,
        }
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            StreamVerdict::Ack => STREAM_ACK,
            StreamVerdict::Corrupted => STREAM_CORRUPTED,
        }
    }
}

/// Device verdict on a display request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayVerdict {
    /// Frame was complete; buffers swapped
    Displayed,
    /// Frame was incomplete; nothing swapped
    Failed,
}

impl DisplayVerdict {
    /// Parse a verdict from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            FRAME_DISPLAYED => Some(DisplayVerdict::Displayed),
            FRAME_FAILED => Some(DisplayVerdict::Failed),
            _ => None,
        }
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            DisplayVerdict::Displayed => FRAME_DISPLAYED,
            DisplayVerdict::Failed => FRAME_FAILED,
        }
    }
}

/// One (value, run length) pair of a compressed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunPair {
    /// Byte value to repeat
    pub value: u8,
    /// Number of repetitions
    pub run: u8,
}

/// Split a compressed chunk into its four (value, run) pairs
pub fn run_pairs(chunk: &[u8; CHUNK_LEN]) -> [RunPair; CHUNK_LEN / 2] {
    let mut pairs = [RunPair { value: 0, run: 0 }; CHUNK_LEN / 2];
    for (i, pair) in pairs.iter_mut().enumerate() {
        pair.value = chunk[2 * i];
        pair.run = chunk[2 * i + 1];
    }
    pairs
}
