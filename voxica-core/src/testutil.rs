//! Shared test doubles for the engine tests

use heapless::{Deque, Vec};

use voxica_hal::{DelayUs, MonotonicClock, SerialPort};

use crate::codec::VoxelFrame;
use crate::geometry::MAX_FRAME_LEN;
use crate::traits::{PlaneDriver, Tick};

/// Deterministic clock
///
/// `now_us` returns the current instant and then advances it by `step`
/// (zero keeps the clock frozen between explicit mutations); `delay_us`
/// advances it by exactly the requested amount and records the total.
pub struct MockClock {
    now: u64,
    step: u64,
    pub delayed_us: u64,
}

impl MockClock {
    /// Frozen clock at the given instant
    pub fn starting_at(now: u64) -> Self {
        Self {
            now,
            step: 0,
            delayed_us: 0,
        }
    }

    /// Clock starting at zero that advances on every read
    pub fn with_step(step: u64) -> Self {
        Self {
            now: 0,
            step,
            delayed_us: 0,
        }
    }

    /// Jump to an absolute instant
    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }
}

impl MonotonicClock for MockClock {
    fn now_us(&mut self) -> u64 {
        let now = self.now;
        self.now += self.step;
        now
    }
}

impl DelayUs for MockClock {
    fn delay_us(&mut self, us: u64) {
        self.now += us;
        self.delayed_us += us;
    }
}

/// Refresh driver that records every callback
pub struct RecordingPlane {
    pub refreshes: usize,
    pub last_frame: Vec<u8, MAX_FRAME_LEN>,
    /// Return [`Tick::Terminate`] from this refresh onwards
    pub terminate_after: Option<usize>,
}

impl RecordingPlane {
    pub fn new() -> Self {
        Self {
            refreshes: 0,
            last_frame: Vec::new(),
            terminate_after: None,
        }
    }
}

impl PlaneDriver for RecordingPlane {
    fn refresh(&mut self, frame: &VoxelFrame<'_>) -> Tick {
        self.refreshes += 1;
        self.last_frame.clear();
        let _ = self.last_frame.extend_from_slice(frame.as_bytes());

        match self.terminate_after {
            Some(n) if self.refreshes >= n => Tick::Terminate,
            _ => Tick::Continue,
        }
    }
}

struct Reply {
    trigger: u8,
    bytes: Vec<u8, 64>,
}

/// Serial mock scripted around the device-driven protocol
///
/// Bytes can be queued directly with [`feed`](Self::feed), or armed with
/// [`reply_on`](Self::reply_on) to arrive once the device writes a given
/// opcode, mirroring a host that answers each request.
pub struct ScriptedSerial {
    rx: Deque<u8, 256>,
    pub tx: Vec<u8, 256>,
    replies: Deque<Reply, 8>,
    pub opened: bool,
    pub closed: bool,
    pub fail_open: bool,
    pub fail_reads: bool,
}

impl ScriptedSerial {
    pub fn new() -> Self {
        Self {
            rx: Deque::new(),
            tx: Vec::new(),
            replies: Deque::new(),
            opened: false,
            closed: false,
            fail_open: false,
            fail_reads: false,
        }
    }

    /// Queue host bytes for immediate delivery
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.rx.push_back(byte).unwrap();
        }
    }

    /// Queue host bytes delivered when the device next writes `trigger`
    pub fn reply_on(&mut self, trigger: u8, bytes: &[u8]) {
        let mut reply = Reply {
            trigger,
            bytes: Vec::new(),
        };
        reply.bytes.extend_from_slice(bytes).unwrap();
        assert!(self.replies.push_back(reply).is_ok());
    }
}

impl SerialPort for ScriptedSerial {
    type Error = ();

    fn open(&mut self) -> Result<(), ()> {
        if self.fail_open {
            return Err(());
        }
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ()> {
        self.closed = true;
        Ok(())
    }

    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Result<Option<u8>, ()> {
        if self.fail_reads {
            return Err(());
        }
        Ok(self.rx.pop_front())
    }

    fn write(&mut self, byte: u8) -> Result<(), ()> {
        self.tx.push(byte).map_err(|_| ())?;

        let triggered = matches!(self.replies.front(), Some(reply) if reply.trigger == byte);
        if triggered {
            if let Some(reply) = self.replies.pop_front() {
                for &b in reply.bytes.iter() {
                    self.rx.push_back(b).unwrap();
                }
            }
        }
        Ok(())
    }
}
