//! Byte-oriented serial transport abstraction
//!
//! The streaming protocol is a strict byte-at-a-time exchange with its own
//! deadline handling, so the trait exposes a non-blocking single-byte read
//! rather than a blocking buffered one.

/// Byte-duplex serial port
///
/// Implementations wrap a UART, a USB CDC endpoint, or a host-side mock.
pub trait SerialPort {
    /// Error type for transport operations
    type Error;

    /// Open the port and begin communication
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Close the port
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Number of received bytes waiting to be read
    fn available(&mut self) -> usize;

    /// Read one byte if available
    ///
    /// Returns `Ok(None)` when the receive buffer is empty; never blocks.
    fn read(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Write one byte
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Write a run of bytes
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            self.write(byte)?;
        }
        Ok(())
    }
}

/// Serial link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { baudrate: 115_200 }
    }
}
