//! Window: the unit of raw signal capture
//!
//! A window is filled sample-by-sample under a wall-clock deadline and
//! finished exactly once: truncated to the expected length, zero-padded
//! when close enough to complete, rejected otherwise.

use crate::error::{SynapseError, SynapseResult};

/// One raw amplitude sample from the device, already masked to 7 bits
pub type Sample = u8;

/// Sampling rate substituted when measurement fails or is degenerate
pub const DEFAULT_RATE_HZ: u32 = 250;

/// Measured rates below this are considered unusable
pub const MIN_USABLE_RATE_HZ: u32 = 10;

/// Minimum fraction of expected samples for a window to be usable
pub const COMPLETENESS_THRESHOLD: f32 = 0.8;

/// Outcome of finishing a capture
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Window captured with at least the completeness threshold, padded
    /// or truncated to exactly the expected length
    Complete(Window),
    /// Too few samples arrived before the deadline; no usable window
    Incomplete {
        /// Samples captured before padding would have applied
        captured: usize,
        /// Samples a full window requires
        expected: usize,
    },
}

impl CaptureOutcome {
    /// Unwrap a complete window or convert into the insufficient-data error
    pub fn into_window(self) -> SynapseResult<Window> {
        match self {
            CaptureOutcome::Complete(window) => Ok(window),
            CaptureOutcome::Incomplete { captured, expected } => {
                Err(SynapseError::InsufficientData { captured, expected })
            }
        }
    }
}

/// Fixed-duration run of raw samples
///
/// Mutable only through [`WindowBuilder`]; once finished the sample
/// sequence never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    samples: Vec<Sample>,
    rate_hz: u32,
}

impl Window {
    /// Build a window directly from raw samples, applying the same
    /// truncate/pad/reject policy as a live capture. Used when reading
    /// recorded examples back from storage.
    pub fn from_samples(samples: Vec<Sample>, rate_hz: u32, expected: usize) -> CaptureOutcome {
        let mut builder = WindowBuilder::new(rate_hz, expected);
        for sample in samples {
            builder.push(sample);
        }
        builder.finish()
    }

    /// Sample sequence, exactly the expected length
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sampling rate the window was captured at
    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples converted to floating point for the conditioning stages
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| f32::from(s)).collect()
    }
}

/// Accumulates samples for one window during a capture
#[derive(Debug)]
pub struct WindowBuilder {
    samples: Vec<Sample>,
    rate_hz: u32,
    expected: usize,
}

impl WindowBuilder {
    /// Start an empty window expecting `expected` samples
    pub fn new(rate_hz: u32, expected: usize) -> Self {
        WindowBuilder {
            samples: Vec::with_capacity(expected),
            rate_hz,
            expected,
        }
    }

    /// Expected number of samples for a full window
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Samples accumulated so far
    pub fn captured(&self) -> usize {
        self.samples.len()
    }

    /// True once the expected sample count has arrived
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.expected
    }

    /// Append one sample; extra samples past the expected count are
    /// dropped at finish time, not here, so captures can simply stop
    /// polling once `is_full` reports true.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Finish the capture: truncate to the expected length, then either
    /// zero-pad (captured >= threshold) or reject as incomplete.
    pub fn finish(mut self) -> CaptureOutcome {
        self.samples.truncate(self.expected);
        let captured = self.samples.len();

        let threshold = (self.expected as f32 * COMPLETENESS_THRESHOLD).ceil() as usize;
        if captured < threshold {
            return CaptureOutcome::Incomplete {
                captured,
                expected: self.expected,
            };
        }

        self.samples.resize(self.expected, 0);
        CaptureOutcome::Complete(Window {
            samples: self.samples,
            rate_hz: self.rate_hz,
        })
    }

    /// Abort the capture, discarding all partial data
    pub fn discard(self) {}
}
