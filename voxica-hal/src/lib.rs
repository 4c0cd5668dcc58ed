//! Voxica Hardware Abstraction Layer
//!
//! This crate defines the hardware traits consumed by the cube engines.
//! Board crates implement them on top of the actual timer and serial
//! peripherals; the engines in `voxica-core` stay board-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Engines (voxica-core)                  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  voxica-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  board crate  │       │  host mocks   │
//! │  (timers,     │       │  (tests,      │
//! │   UART)       │       │   simulators) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`clock::MonotonicClock`], [`clock::DelayUs`] - Microsecond timekeeping
//! - [`serial::SerialPort`] - Byte-oriented serial transport

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod serial;

// Re-export key traits at crate root for convenience
pub use clock::{DelayUs, MonotonicClock, TimeSource};
pub use serial::{SerialConfig, SerialPort};
