//! Simulated acquisition device over loopback TCP
//!
//! Binds an ephemeral port and serves generated amplitude bytes from a
//! background thread, one client at a time. Pacing and an optional
//! close-after-N-samples limit make the disconnect and low-rate
//! scenarios reproducible in tests.

use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use synapse_core::{SynapseError, SynapseResult};
use tracing::debug;

use crate::generator::SignalModel;

/// Serving behavior for a simulated device
#[derive(Debug, Clone, Copy)]
pub struct DeviceOptions {
    /// Bytes per second to emit; `None` emits as fast as the socket
    /// accepts them
    pub pace_hz: Option<u32>,
    /// Stop serving after this many samples in total; `None` serves
    /// clients until the process ends
    pub disconnect_after: Option<u64>,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        DeviceOptions {
            pace_hz: None,
            disconnect_after: None,
        }
    }
}

/// A loopback TCP device serving clients from a background thread
pub struct SimulatedDevice {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatedDevice {
    /// Spawn a device serving `model` with the given options. Clients
    /// are served one at a time; the generator state carries across
    /// connections so the stream is one continuous signal.
    pub fn spawn(mut model: SignalModel, options: DeviceOptions) -> SynapseResult<Self> {
        let listener =
            TcpListener::bind("127.0.0.1:0").map_err(|source| SynapseError::Connection {
                context: "simulated device bind",
                source,
            })?;
        let addr = listener
            .local_addr()
            .map_err(|source| SynapseError::Connection {
                context: "simulated device address",
                source,
            })?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let handle = thread::spawn(move || {
            // Pacing in small batches keeps timing error bounded without
            // sleeping per byte
            let batch = match options.pace_hz {
                Some(hz) => (hz as usize / 50).max(1),
                None => 64,
            };
            let batch_sleep = options
                .pace_hz
                .map(|hz| Duration::from_secs_f64(batch as f64 / f64::from(hz.max(1))));

            let mut sent: u64 = 0;
            let mut buffer = vec![0u8; batch];
            'serving: loop {
                let Ok((mut stream, peer)) = listener.accept() else {
                    return;
                };
                if stop.load(Ordering::SeqCst) {
                    return;
                }
                debug!(%peer, "simulated device client connected");

                loop {
                    if stop.load(Ordering::SeqCst) {
                        return;
                    }
                    let remaining = options
                        .disconnect_after
                        .map(|limit| limit.saturating_sub(sent))
                        .unwrap_or(u64::MAX);
                    if remaining == 0 {
                        debug!(sent, "simulated device stopping after sample limit");
                        break 'serving;
                    }

                    let take = buffer.len().min(remaining as usize);
                    model.fill(&mut buffer[..take]);
                    if stream.write_all(&buffer[..take]).is_err() {
                        // Client hung up; wait for the next one
                        break;
                    }
                    sent += take as u64;

                    if let Some(sleep) = batch_sleep {
                        thread::sleep(sleep);
                    }
                }
            }
        });

        Ok(SimulatedDevice {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Address clients should connect to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // A blocked accept cannot observe the flag; connect once to
        // wake it, then join so the listener is closed before drop
        // returns and the port is free for the next test.
        let _ = TcpStream::connect_timeout(&self.addr, Duration::from_millis(100));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
