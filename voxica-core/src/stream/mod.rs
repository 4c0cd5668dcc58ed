//! Live frame streaming over a serial link
//!
//! A protocol state machine assembles frames chunk by chunk into a write
//! buffer and publishes complete frames to the display buffer with a single
//! atomic swap, all while keeping the physical refresh ticking on the same
//! thread.

mod buffer;
mod deadline;
mod engine;

pub use engine::{StreamState, StreamingEngine};
