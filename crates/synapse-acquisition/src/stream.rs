//! Stream source abstraction over the device byte channel
//!
//! The device emits one amplitude byte per sample; the top bit is a
//! framing bit and is masked off. Reads are bounded-wait: a read that
//! yields nothing within its wait budget is "no sample this tick", and
//! a dropped connection flips the source into a terminal disconnected
//! state instead of raising errors on every subsequent poll.

use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use synapse_core::{Sample, SynapseError, SynapseResult};

/// Framing/parity bit mask: only the low 7 bits carry amplitude
const AMPLITUDE_MASK: u8 = 0x7F;

/// Minimum socket read timeout; zero is rejected by the OS
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Wall-clock deadline token bounding a capture or calibration run
///
/// Passed through the acquisition calls so cancellation and timeout are
/// one mechanism rather than scattered clock polling.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    /// Start a deadline running now
    pub fn new(limit: Duration) -> Self {
        Deadline {
            start: Instant::now(),
            limit,
        }
    }

    /// Deadline that expires after `secs` whole seconds
    pub fn seconds(secs: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(secs)))
    }

    /// True once the wall-clock budget is spent
    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.limit
    }

    /// Remaining budget, zero once expired
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.start.elapsed())
    }

    /// Wait budget for one poll tick: the smaller of `tick` and the
    /// remaining deadline, floored so socket timeouts stay valid
    pub fn tick_wait(&self, tick: Duration) -> Duration {
        self.remaining().min(tick).max(MIN_READ_TIMEOUT)
    }
}

/// A connection yielding zero or one amplitude sample per poll
pub trait SampleSource {
    /// Wait up to `wait` for the next sample. `None` means no sample
    /// arrived this tick; it is not an error.
    fn next_sample(&mut self, wait: Duration) -> Option<Sample>;

    /// False once the underlying channel is known to be gone. A
    /// disconnected source keeps answering `None`.
    fn is_connected(&self) -> bool;
}

/// TCP byte stream to the acquisition device
#[derive(Debug)]
pub struct TcpSampleSource {
    stream: TcpStream,
    read_timeout: Option<Duration>,
    connected: bool,
}

impl TcpSampleSource {
    /// Connect to the device endpoint with a bounded connect timeout
    pub fn connect(addr: SocketAddr, timeout: Duration) -> SynapseResult<Self> {
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|source| {
            SynapseError::Connection {
                context: "device stream connect",
                source,
            }
        })?;
        stream
            .set_nodelay(true)
            .map_err(|source| SynapseError::Connection {
                context: "device stream setup",
                source,
            })?;
        Ok(TcpSampleSource {
            stream,
            read_timeout: None,
            connected: true,
        })
    }

    fn set_wait(&mut self, wait: Duration) {
        let wait = wait.max(MIN_READ_TIMEOUT);
        if self.read_timeout != Some(wait) {
            if self.stream.set_read_timeout(Some(wait)).is_err() {
                self.connected = false;
                return;
            }
            self.read_timeout = Some(wait);
        }
    }
}

impl SampleSource for TcpSampleSource {
    fn next_sample(&mut self, wait: Duration) -> Option<Sample> {
        if !self.connected {
            return None;
        }
        self.set_wait(wait);

        let mut byte = [0u8; 1];
        match self.stream.read(&mut byte) {
            Ok(0) => {
                // Remote end closed the stream
                self.connected = false;
                None
            }
            Ok(_) => Some(byte[0] & AMPLITUDE_MASK),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                None
            }
            Err(_) => {
                self.connected = false;
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
