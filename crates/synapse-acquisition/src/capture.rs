//! Deadline-bounded window capture
//!
//! Polls a sample source until the expected sample count arrives or the
//! wall-clock deadline elapses, whichever comes first. Reads that yield
//! nothing are ticks, not errors; the truncate/pad/reject policy lives
//! in [`WindowBuilder::finish`].

use std::time::Duration;

use synapse_core::{CaptureOutcome, Window, WindowBuilder};
use tracing::debug;

use crate::stream::{Deadline, SampleSource};

/// Poll granularity during capture
const CAPTURE_TICK: Duration = Duration::from_millis(20);

/// Collects fixed-duration windows from a sample source
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowCapturer;

impl WindowCapturer {
    pub fn new() -> Self {
        WindowCapturer
    }

    /// Capture one window of `rate_hz * duration_secs` samples, bounded
    /// by a deadline of `duration_secs` wall-clock seconds.
    pub fn capture(
        &self,
        source: &mut dyn SampleSource,
        rate_hz: u32,
        duration_secs: u32,
    ) -> CaptureOutcome {
        let deadline = Deadline::seconds(duration_secs);
        self.capture_with_deadline(source, rate_hz, duration_secs, &deadline)
    }

    /// Capture against a caller-owned deadline token. A deadline that is
    /// already expired acts as cancellation: partial data is discarded
    /// and the outcome is `Incomplete`, never a short window dressed up
    /// as real data.
    pub fn capture_with_deadline(
        &self,
        source: &mut dyn SampleSource,
        rate_hz: u32,
        duration_secs: u32,
        deadline: &Deadline,
    ) -> CaptureOutcome {
        let expected = (rate_hz as usize) * (duration_secs as usize);
        let mut builder = WindowBuilder::new(rate_hz, expected);

        while !builder.is_full() && !deadline.expired() {
            let wait = deadline.tick_wait(CAPTURE_TICK);
            match source.next_sample(wait) {
                Some(sample) => builder.push(sample),
                None if !source.is_connected() => {
                    // The stream is gone; keep honoring the deadline so a
                    // stalled device cannot return early with a window that
                    // looks deliberately short.
                    std::thread::sleep(wait);
                }
                None => {}
            }
        }

        debug!(
            captured = builder.captured(),
            expected = builder.expected(),
            "capture finished"
        );
        builder.finish()
    }

    /// Capture and convert an incomplete outcome into the
    /// insufficient-data error for callers that need a window or nothing
    pub fn capture_window(
        &self,
        source: &mut dyn SampleSource,
        rate_hz: u32,
        duration_secs: u32,
    ) -> synapse_core::SynapseResult<Window> {
        self.capture(source, rate_hz, duration_secs).into_window()
    }
}
