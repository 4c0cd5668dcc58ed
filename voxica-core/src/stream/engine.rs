//! Streaming protocol state machine
//!
//! The device drives the host: after the handshake it repeatedly polls for
//! chunk data, staging bytes into the write buffer and committing them on
//! an acknowledged end-of-stream, until the host asks for the assembled
//! frame to be displayed. All serial waits share the iteration's
//! [`RequestWindow`], which also keeps the physical refresh ticking during
//! long waits.

use core::convert::Infallible;

use voxica_hal::{DelayUs, MonotonicClock, SerialPort, TimeSource};
use voxica_protocol::packets::{
    run_pairs, DisplayVerdict, StreamCommand, StreamVerdict, CHUNK_LEN, INIT_ACKNOWLEDGE,
    INIT_REQUEST, INIT_START, STREAM_END, STREAM_REQUEST, TERMINATE,
};

use super::buffer::DoubleBuffer;
use super::deadline::{RequestWindow, TICK_MARGIN_US};
use crate::codec::VoxelFrame;
use crate::config::{self, ConfigError};
use crate::geometry::{GeometryDescriptor, Voxel};
use crate::traits::{PlaneDriver, Tick};

/// Streaming engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamState {
    /// Waiting for the host to initiate; unbounded by design
    AwaitingHandshake,
    /// Frame exchanges active
    Streaming,
    /// Stopped; the refresh callback keeps firing forever
    Terminated,
}

/// Live streaming engine
///
/// Like the playback engine, [`start`](Self::start) takes permanent
/// ownership of the thread of control. Frames arrive over the serial link
/// and are published by atomic buffer swap; decode queries always answer
/// over the last published frame.
pub struct StreamingEngine {
    geometry: GeometryDescriptor,
    plane_rate: u16,
    tick_period_us: u64,
    /// Serial wait allowance between refresh checkpoints
    retrieve_budget_us: u64,
    buffer: DoubleBuffer,
    state: StreamState,
    stop_requested: bool,
}

impl StreamingEngine {
    /// Create an engine for the given geometry
    pub fn new(geometry: GeometryDescriptor, plane_rate: u16) -> Self {
        Self {
            geometry,
            plane_rate,
            tick_period_us: 0,
            retrieve_budget_us: 0,
            buffer: DoubleBuffer::new(geometry.frame_len()),
            state: StreamState::AwaitingHandshake,
            stop_requested: false,
        }
    }

    /// Create an engine from untrusted geometry values, clamping them
    pub fn from_raw(cube_side: u8, channel_count: u8, channel_size: u8, plane_rate: u16) -> Self {
        Self::new(
            GeometryDescriptor::sanitize(cube_side, channel_count, channel_size),
            plane_rate,
        )
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Geometry advertised during the handshake
    pub fn geometry(&self) -> GeometryDescriptor {
        self.geometry
    }

    /// View of the last published frame
    pub fn frame(&self) -> VoxelFrame<'_> {
        VoxelFrame::new(self.geometry, self.buffer.display_frame())
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

    /// Announce termination to the host and close the link
    pub fn terminate<S: SerialPort>(&mut self, serial: &mut S) {
        let _ = serial.write(TERMINATE);
        let _ = serial.close();
        self.state = StreamState::Terminated;
    }

    fn configure_timing(&mut self) -> Result<(), ConfigError> {
        self.tick_period_us = config::tick_period_us(self.plane_rate)?;
        self.retrieve_budget_us = self.tick_period_us.saturating_sub(TICK_MARGIN_US);
        Ok(())
    }

    /// Run the streaming loop
    ///
    /// Fails fast with [`ConfigError`] before any communication;
    /// afterwards it never returns.
    pub fn start<S, T, P>(
        &mut self,
        serial: &mut S,
        time: &mut T,
        plane: &mut P,
    ) -> Result<Infallible, ConfigError>
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        self.configure_timing()?;
        serial
            .open()
            .map_err(|_| ConfigError::TransportUnavailable)?;

        loop {
            match self.state {
                StreamState::AwaitingHandshake => self.await_handshake(serial, time, plane),
                StreamState::Streaming => self.stream_iteration(serial, time, plane),
                StreamState::Terminated => {
                    // Terminal state: keep the physical refresh alive for
                    // the rest of program life.
                    let frame = VoxelFrame::new(self.geometry, self.buffer.display_frame());
                    plane.refresh(&frame);
                }
            }
        }
    }

    /// One attempt at the three-way handshake
    ///
    /// The wait is unbounded and fires no refresh ticks: the window stays
    /// unarmed until streaming begins. Any unexpected byte (or transport
    /// error) abandons the attempt and the wait restarts.
    fn await_handshake<S, T, P>(&mut self, serial: &mut S, time: &mut T, plane: &mut P)
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        let mut window = RequestWindow::unarmed();

        let request = match self.read_byte(&mut window, serial, time, plane) {
            Some(byte) => byte,
            None => return,
        };
        if request != INIT_REQUEST {
            return;
        }

        let hello = [
            INIT_START,
            self.geometry.cube_side(),
            self.geometry.channel_count(),
            self.geometry.channel_size(),
        ];
        if serial.write_all(&hello).is_err() {
            return;
        }

        match self.read_byte(&mut window, serial, time, plane) {
            Some(INIT_ACKNOWLEDGE) => self.state = StreamState::Streaming,
            _ => {}
        }
    }

    /// One scheduling iteration: request exchanges, residual sleep, tick
    fn stream_iteration<S, T, P>(&mut self, serial: &mut S, time: &mut T, plane: &mut P)
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        let start = time.now_us();
        let mut window = RequestWindow::armed(start);

        while self.service_request(&mut window, serial, time, plane) {}

        let reference = window.checkpoint_us().unwrap_or(start);
        let elapsed = time.now_us().saturating_sub(reference);
        time.delay_us(self.tick_period_us.saturating_sub(elapsed));
        self.tick(plane);

        if self.stop_requested {
            self.terminate(serial);
        }
    }

    /// One request exchange; returns whether the repeat loop may continue
    fn service_request<S, T, P>(
        &mut self,
        window: &mut RequestWindow,
        serial: &mut S,
        time: &mut T,
        plane: &mut P,
    ) -> bool
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        if !self.drain_receive(window, serial, time, plane) {
            return false;
        }

        if serial.write(STREAM_REQUEST).is_err() {
            return false;
        }
        let command = match self.read_byte(window, serial, time, plane) {
            Some(byte) => byte,
            None => return false,
        };

        match StreamCommand::from_byte(command) {
            Some(StreamCommand::Compressed) => {
                let mut chunk = [0u8; CHUNK_LEN];
                if !self.read_exact(window, serial, time, plane, &mut chunk) {
                    return false;
                }
                let staged = self.stage_compressed(&chunk);
                self.end_of_stream(window, serial, time, plane, staged)
            }
            Some(StreamCommand::Raw) => {
                let mut chunk = [0u8; CHUNK_LEN];
                if !self.read_exact(window, serial, time, plane, &mut chunk) {
                    return false;
                }
                let staged = self.stage_raw(&chunk);
                self.end_of_stream(window, serial, time, plane, staged)
            }
            Some(StreamCommand::Display) => {
                let verdict = if self.buffer.is_complete() {
                    self.buffer.swap();
                    DisplayVerdict::Displayed
                } else {
                    DisplayVerdict::Failed
                };
                let sent = serial.write(verdict.to_byte()).is_ok();
                // A new frame assembly begins after any display attempt
                self.buffer.reset_stride();
                sent
            }
            // Unrecognized byte: ignore it and keep polling
            None => true,
        }
    }

    /// Read and answer the 2-byte end-of-stream packet
    ///
    /// On a matching terminator the staged bytes are committed into the
    /// stride; otherwise the host is told to resend and nothing commits.
    fn end_of_stream<S, T, P>(
        &mut self,
        window: &mut RequestWindow,
        serial: &mut S,
        time: &mut T,
        plane: &mut P,
        staged: usize,
    ) -> bool
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        let mut end = [0u8; 2];
        if !self.read_exact(window, serial, time, plane, &mut end) {
            return false;
        }

        if end[0] == STREAM_END {
            // end[1] is a checksum byte, reserved and not yet validated
            if serial.write(StreamVerdict::Ack.to_byte()).is_err() {
                return false;
            }
            self.buffer.commit(staged);
        } else if serial.write(StreamVerdict::Corrupted.to_byte()).is_err() {
            return false;
        }
        true
    }

    /// Stage literal chunk bytes at the stride, bounded by capacity
    fn stage_raw(&mut self, chunk: &[u8; CHUNK_LEN]) -> usize {
        let mut staged = 0;
        for &byte in chunk {
            if !self.buffer.stage(staged, byte) {
                break;
            }
            staged += 1;
        }
        staged
    }

    /// Expand (value, run) pairs at the stride, truncating without overrun
    fn stage_compressed(&mut self, chunk: &[u8; CHUNK_LEN]) -> usize {
        let mut staged = 0;
        for pair in run_pairs(chunk) {
            for _ in 0..pair.run {
                if !self.buffer.stage(staged, pair.value) {
                    return staged;
                }
                staged += 1;
            }
        }
        staged
    }

    /// Empty the receive buffer within the window's budget
    fn drain_receive<S, T, P>(
        &mut self,
        window: &mut RequestWindow,
        serial: &mut S,
        time: &mut T,
        plane: &mut P,
    ) -> bool
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        while serial.available() > 0 && self.has_time_left(window, time, plane) {
            if serial.read().is_err() {
                return false;
            }
        }
        serial.available() == 0
    }

    /// Poll for one byte until the window runs out
    fn read_byte<S, T, P>(
        &mut self,
        window: &mut RequestWindow,
        serial: &mut S,
        time: &mut T,
        plane: &mut P,
    ) -> Option<u8>
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        loop {
            match serial.read() {
                Ok(Some(byte)) => return Some(byte),
                Ok(None) => {}
                Err(_) => return None,
            }
            if !self.has_time_left(window, time, plane) {
                return None;
            }
        }
    }

    /// Fill `buf` byte by byte within the window's budget
    fn read_exact<S, T, P>(
        &mut self,
        window: &mut RequestWindow,
        serial: &mut S,
        time: &mut T,
        plane: &mut P,
        buf: &mut [u8],
    ) -> bool
    where
        S: SerialPort,
        T: TimeSource,
        P: PlaneDriver,
    {
        for slot in buf.iter_mut() {
            match self.read_byte(window, serial, time, plane) {
                Some(byte) => *slot = byte,
                None => return false,
            }
        }
        true
    }

    /// Check the window, firing the refresh when a checkpoint elapses
    ///
    /// An unarmed window always has time and never refreshes. For an armed
    /// window, once the wait since the last checkpoint exceeds the
    /// retrieve budget, the residual tick period is slept out and the
    /// plane driver fires, so a slow host cannot starve the display.
    fn has_time_left<T, P>(
        &mut self,
        window: &mut RequestWindow,
        time: &mut T,
        plane: &mut P,
    ) -> bool
    where
        T: MonotonicClock + DelayUs,
        P: PlaneDriver,
    {
        let checkpoint = match window.checkpoint_us() {
            Some(checkpoint) => checkpoint,
            None => return true,
        };

        let now = time.now_us();
        if window.expired(now) {
            return false;
        }

        if now.saturating_sub(checkpoint) > self.retrieve_budget_us {
            let residual = self.tick_period_us.saturating_sub(now.saturating_sub(checkpoint));
            time.delay_us(residual);
            self.tick(plane);
            window.refresh(time.now_us());
        }
        true
    }

    /// Fire the refresh callback over the published frame
    fn tick<P: PlaneDriver>(&mut self, plane: &mut P) {
        let frame = VoxelFrame::new(self.geometry, self.buffer.display_frame());
        let directive = plane.refresh(&frame);
        if directive == Tick::Terminate {
            self.stop_requested = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockClock, RecordingPlane, ScriptedSerial};
    use voxica_protocol::packets::{
        COMPRESSED_START, DISPLAY, FRAME_DISPLAYED, FRAME_FAILED, RAW_START, STREAM_ACK,
        STREAM_CORRUPTED,
    };

    fn streaming_engine(
        cube_side: u8,
        channel_size: u8,
        plane_rate: u16,
    ) -> StreamingEngine {
        let mut engine = StreamingEngine::from_raw(cube_side, 1, channel_size, plane_rate);
        engine.configure_timing().unwrap();
        engine.state = StreamState::Streaming;
        engine
    }

    #[test]
    fn test_handshake_replies_geometry() {
        let mut engine = StreamingEngine::from_raw(2, 1, 1, 100);
        engine.configure_timing().unwrap();
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();

        serial.feed(&[INIT_REQUEST]);
        serial.reply_on(INIT_START, &[INIT_ACKNOWLEDGE]);
        engine.await_handshake(&mut serial, &mut clock, &mut plane);

        assert_eq!(engine.state(), StreamState::Streaming);
        assert_eq!(serial.tx.as_slice(), &[INIT_START, 2, 1, 1]);
        // The handshake never fires the refresh
        assert_eq!(plane.refreshes, 0);
    }

    #[test]
    fn test_handshake_ignores_garbage() {
        let mut engine = StreamingEngine::from_raw(2, 1, 1, 100);
        engine.configure_timing().unwrap();
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();

        serial.feed(&[0x55]);
        engine.await_handshake(&mut serial, &mut clock, &mut plane);
        assert_eq!(engine.state(), StreamState::AwaitingHandshake);
        assert!(serial.tx.is_empty());

        // The wait simply restarts
        serial.feed(&[INIT_REQUEST]);
        serial.reply_on(INIT_START, &[INIT_ACKNOWLEDGE]);
        engine.await_handshake(&mut serial, &mut clock, &mut plane);
        assert_eq!(engine.state(), StreamState::Streaming);
    }

    #[test]
    fn test_handshake_requires_acknowledge() {
        let mut engine = StreamingEngine::from_raw(2, 1, 1, 100);
        engine.configure_timing().unwrap();
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();

        serial.feed(&[INIT_REQUEST]);
        serial.reply_on(INIT_START, &[0x42]);
        engine.await_handshake(&mut serial, &mut clock, &mut plane);

        assert_eq!(engine.state(), StreamState::AwaitingHandshake);
        assert_eq!(serial.tx.as_slice(), &[INIT_START, 2, 1, 1]);
    }

    #[test]
    fn test_raw_chunk_commits_stride() {
        let mut engine = streaming_engine(2, 8, 100); // 8-byte frame
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        serial.reply_on(
            STREAM_REQUEST,
            &[RAW_START, 1, 2, 3, 4, 5, 6, 7, 8, STREAM_END, 0x00],
        );
        let keep_going = engine.service_request(&mut window, &mut serial, &mut clock, &mut plane);

        assert!(keep_going);
        assert_eq!(engine.buffer.stride(), 8);
        assert!(engine.buffer.is_complete());
        assert_eq!(engine.buffer.write_frame(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(serial.tx.as_slice(), &[STREAM_REQUEST, STREAM_ACK]);
        // Nothing published yet
        assert_eq!(engine.frame().as_bytes(), &[0u8; 8]);
    }

    #[test]
    fn test_compressed_chunk_expands_runs() {
        let mut engine = streaming_engine(2, 8, 100);
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        serial.reply_on(
            STREAM_REQUEST,
            &[COMPRESSED_START, 0xAB, 5, 0x11, 3, 0, 0, 0, 0, STREAM_END, 0x00],
        );
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));

        assert_eq!(engine.buffer.stride(), 8);
        assert_eq!(
            engine.buffer.write_frame(),
            &[0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0x11, 0x11, 0x11]
        );
        assert_eq!(serial.tx.as_slice(), &[STREAM_REQUEST, STREAM_ACK]);
    }

    #[test]
    fn test_compressed_run_truncates_at_capacity() {
        let mut engine = streaming_engine(2, 1, 100); // 1-byte frame
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        serial.reply_on(
            STREAM_REQUEST,
            &[COMPRESSED_START, 0xAB, 5, 0, 0, 0, 0, 0, 0, STREAM_END, 0x00],
        );
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));

        // The 5-byte run stops at the 1-byte frame boundary, no overrun
        assert_eq!(engine.buffer.stride(), 1);
        assert_eq!(engine.buffer.write_frame(), &[0xAB]);
        assert_eq!(serial.tx.as_slice(), &[STREAM_REQUEST, STREAM_ACK]);
    }

    #[test]
    fn test_corrupted_terminator_discards_chunk() {
        let mut engine = streaming_engine(2, 8, 100);
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        serial.reply_on(
            STREAM_REQUEST,
            &[RAW_START, 1, 2, 3, 4, 5, 6, 7, 8, 0x13, 0x00],
        );
        let keep_going = engine.service_request(&mut window, &mut serial, &mut clock, &mut plane);

        // The exchange itself completed; only the chunk was rejected
        assert!(keep_going);
        assert_eq!(engine.buffer.stride(), 0);
        assert_eq!(serial.tx.as_slice(), &[STREAM_REQUEST, STREAM_CORRUPTED]);
    }

    #[test]
    fn test_display_before_complete_fails() {
        let mut engine = streaming_engine(2, 8, 100);
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        serial.reply_on(STREAM_REQUEST, &[DISPLAY]);
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));

        assert_eq!(serial.tx.as_slice(), &[STREAM_REQUEST, FRAME_FAILED]);
        assert_eq!(engine.buffer.stride(), 0);
        assert_eq!(engine.frame().as_bytes(), &[0u8; 8]);
    }

    #[test]
    fn test_full_frame_display_swaps() {
        // 2×2×2 cube, 1 channel, 1 bit = 1-byte frame
        let mut engine = streaming_engine(2, 1, 100);
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        serial.reply_on(
            STREAM_REQUEST,
            &[RAW_START, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, STREAM_END, 0x5A],
        );
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));
        assert!(engine.buffer.is_complete());

        serial.reply_on(STREAM_REQUEST, &[DISPLAY]);
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));

        assert_eq!(
            serial.tx.as_slice(),
            &[STREAM_REQUEST, STREAM_ACK, STREAM_REQUEST, FRAME_DISPLAYED]
        );
        assert_eq!(engine.buffer.stride(), 0);
        assert_eq!(engine.frame().as_bytes(), &[0xFF]);

        // Every voxel of the published frame reads on
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    assert!(engine.voxel_state(Voxel::new(x, y, z)));
                }
            }
        }
    }

    #[test]
    fn test_display_frame_stable_until_next_swap() {
        let mut engine = streaming_engine(2, 1, 100);
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        for reply in [
            &[RAW_START, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, STREAM_END, 0][..],
            &[DISPLAY][..],
        ] {
            serial.reply_on(STREAM_REQUEST, reply);
            assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));
        }
        assert_eq!(engine.frame().as_bytes(), &[0xFF]);

        // Assembling the next frame must not disturb the published one
        serial.reply_on(
            STREAM_REQUEST,
            &[RAW_START, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, STREAM_END, 0],
        );
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));
        assert_eq!(engine.frame().as_bytes(), &[0xFF]);

        serial.reply_on(STREAM_REQUEST, &[DISPLAY]);
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));
        assert_eq!(engine.frame().as_bytes(), &[0x00]);
    }

    #[test]
    fn test_timeout_aborts_but_keeps_stride() {
        let mut engine = streaming_engine(4, 8, 100); // 64-byte frame
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        serial.reply_on(
            STREAM_REQUEST,
            &[RAW_START, 1, 2, 3, 4, 5, 6, 7, 8, STREAM_END, 0x00],
        );
        assert!(engine.service_request(&mut window, &mut serial, &mut clock, &mut plane));
        assert_eq!(engine.buffer.stride(), 8);

        // Host goes quiet; every poll advances the clock until the budget
        // runs out
        let mut clock = MockClock::with_step(3_000);
        let mut window = RequestWindow::armed(0);
        let keep_going = engine.service_request(&mut window, &mut serial, &mut clock, &mut plane);

        assert!(!keep_going);
        // Partial progress survives for the next iteration
        assert_eq!(engine.buffer.stride(), 8);
    }

    #[test]
    fn test_long_wait_fires_refresh() {
        let mut engine = streaming_engine(2, 8, 100); // 10 ms period, 9 ms budget
        let mut clock = MockClock::starting_at(9_500);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        assert!(engine.has_time_left(&mut window, &mut clock, &mut plane));
        assert_eq!(plane.refreshes, 1);
        // Residual of the 10 ms period was slept before the tick
        assert_eq!(clock.delayed_us, 500);
        assert_eq!(window.checkpoint_us(), Some(10_000));

        // The hard budget still applies afterwards
        assert!(!engine.has_time_left(&mut window, &mut clock, &mut plane));
    }

    #[test]
    fn test_iteration_ticks_even_without_host() {
        let mut engine = streaming_engine(2, 8, 100);
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::with_step(3_000);
        let mut plane = RecordingPlane::new();

        engine.stream_iteration(&mut serial, &mut clock, &mut plane);

        assert_eq!(serial.tx.as_slice(), &[STREAM_REQUEST]);
        assert_eq!(plane.refreshes, 1);
        assert_eq!(engine.state(), StreamState::Streaming);
    }

    #[test]
    fn test_terminate_directive_ends_streaming() {
        let mut engine = streaming_engine(2, 8, 100);
        let mut serial = ScriptedSerial::new();
        let mut clock = MockClock::with_step(3_000);
        let mut plane = RecordingPlane::new();
        plane.terminate_after = Some(1);

        engine.stream_iteration(&mut serial, &mut clock, &mut plane);

        assert_eq!(engine.state(), StreamState::Terminated);
        assert_eq!(serial.tx.last(), Some(&TERMINATE));
        assert!(serial.closed);
    }

    #[test]
    fn test_transport_error_aborts_request() {
        let mut engine = streaming_engine(2, 8, 100);
        let mut serial = ScriptedSerial::new();
        serial.fail_reads = true;
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();
        let mut window = RequestWindow::armed(0);

        let keep_going = engine.service_request(&mut window, &mut serial, &mut clock, &mut plane);

        assert!(!keep_going);
        assert_eq!(engine.buffer.stride(), 0);
    }

    #[test]
    fn test_start_fails_fast() {
        let mut clock = MockClock::starting_at(0);
        let mut plane = RecordingPlane::new();

        let mut engine = StreamingEngine::from_raw(2, 1, 1, 0);
        let mut serial = ScriptedSerial::new();
        let result = engine.start(&mut serial, &mut clock, &mut plane);
        assert_eq!(result.unwrap_err(), ConfigError::ZeroPlaneRate);
        assert!(!serial.opened);

        let mut engine = StreamingEngine::from_raw(2, 1, 1, 100);
        let mut serial = ScriptedSerial::new();
        serial.fail_open = true;
        let result = engine.start(&mut serial, &mut clock, &mut plane);
        assert_eq!(result.unwrap_err(), ConfigError::TransportUnavailable);
        assert_eq!(plane.refreshes, 0);
    }
}
