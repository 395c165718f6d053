//! Effective sampling-rate estimation
//!
//! The device does not announce its rate; it is measured by counting
//! samples over a calibration interval. Measurement never fails hard:
//! an unreachable device or a degenerate count falls back to the
//! default rate with a warning so a session can always proceed.

use std::net::SocketAddr;
use std::time::Duration;

use synapse_core::{DEFAULT_RATE_HZ, MIN_USABLE_RATE_HZ};
use tracing::{debug, warn};

use crate::stream::{Deadline, SampleSource, TcpSampleSource};

/// Poll granularity during calibration
const CALIBRATION_TICK: Duration = Duration::from_millis(20);

/// Connect timeout used when the estimator opens its own connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of a calibration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateEstimate {
    /// Rate the session should use
    pub rate_hz: u32,
    /// Raw measured rate, zero when the device was unreachable
    pub measured_hz: u32,
    /// True when the default was substituted for a bad measurement
    pub degraded: bool,
}

/// Measures effective samples/second over a calibration interval
#[derive(Debug, Clone, Copy)]
pub struct RateEstimator {
    calibration_secs: u32,
}

impl Default for RateEstimator {
    fn default() -> Self {
        RateEstimator {
            calibration_secs: 2,
        }
    }
}

impl RateEstimator {
    /// Estimator counting over `calibration_secs` wall-clock seconds
    pub fn new(calibration_secs: u32) -> Self {
        RateEstimator {
            calibration_secs: calibration_secs.max(1),
        }
    }

    /// Count samples from an already-open source for the calibration
    /// interval. A source that disconnects mid-measurement just stops
    /// contributing samples; that is end-of-data, not an error.
    pub fn estimate(&self, source: &mut dyn SampleSource) -> RateEstimate {
        let deadline = Deadline::seconds(self.calibration_secs);
        let mut count: u64 = 0;

        while !deadline.expired() {
            let wait = deadline.tick_wait(CALIBRATION_TICK);
            match source.next_sample(wait) {
                Some(_) => count += 1,
                None if !source.is_connected() => {
                    // Nothing more will arrive; let the interval run out
                    std::thread::sleep(wait);
                }
                None => {}
            }
        }

        let measured = (count / u64::from(self.calibration_secs)) as u32;
        if measured < MIN_USABLE_RATE_HZ {
            warn!(
                measured_hz = measured,
                default_hz = DEFAULT_RATE_HZ,
                "low sampling rate detected, using default"
            );
            return RateEstimate {
                rate_hz: DEFAULT_RATE_HZ,
                measured_hz: measured,
                degraded: true,
            };
        }

        debug!(rate_hz = measured, "detected sampling rate");
        RateEstimate {
            rate_hz: measured,
            measured_hz: measured,
            degraded: false,
        }
    }

    /// Open a connection to the device endpoint, measure, and close it.
    /// An unreachable device degrades to the default rate.
    pub fn estimate_endpoint(&self, addr: SocketAddr) -> RateEstimate {
        match TcpSampleSource::connect(addr, CONNECT_TIMEOUT) {
            Ok(mut source) => self.estimate(&mut source),
            Err(e) => {
                warn!(error = %e, default_hz = DEFAULT_RATE_HZ, "using default sampling rate");
                RateEstimate {
                    rate_hz: DEFAULT_RATE_HZ,
                    measured_hz: 0,
                    degraded: true,
                }
            }
        }
    }
}
