//! Synapse-Acquisition: windowed capture from a live EEG byte stream
//!
//! Stream source abstraction, sampling-rate estimation and
//! deadline-bounded window capture.

pub mod capture;
pub mod rate;
pub mod stream;

pub use capture::WindowCapturer;
pub use rate::{RateEstimate, RateEstimator};
pub use stream::{Deadline, SampleSource, TcpSampleSource};

#[cfg(test)]
mod live_tests {
    use std::time::Duration;

    use synapse_core::{CaptureOutcome, DEFAULT_RATE_HZ};
    use synapse_simulation::{DeviceOptions, SignalModel, SimulatedDevice};

    use crate::capture::WindowCapturer;
    use crate::rate::RateEstimator;
    use crate::stream::TcpSampleSource;

    const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn test_capture_complete_window_from_device() {
        let model = SignalModel::resting_alpha(250, 11);
        let device = SimulatedDevice::spawn(model, DeviceOptions::default()).unwrap();
        let mut source = TcpSampleSource::connect(device.addr(), CONNECT_TIMEOUT).unwrap();

        let outcome = WindowCapturer::new().capture(&mut source, 250, 1);
        match outcome {
            CaptureOutcome::Complete(window) => {
                assert_eq!(window.len(), 250);
                assert!(window.samples().iter().all(|&s| s <= 127));
            }
            CaptureOutcome::Incomplete { .. } => panic!("device capture incomplete"),
        }
    }

    #[test]
    fn test_device_disconnect_mid_capture() {
        let model = SignalModel::resting_alpha(250, 12);
        let options = DeviceOptions {
            pace_hz: None,
            disconnect_after: Some(50),
        };
        let device = SimulatedDevice::spawn(model, options).unwrap();
        let mut source = TcpSampleSource::connect(device.addr(), CONNECT_TIMEOUT).unwrap();

        let outcome = WindowCapturer::new().capture(&mut source, 500, 1);
        match outcome {
            CaptureOutcome::Complete(_) => panic!("short capture accepted"),
            CaptureOutcome::Incomplete { captured, expected } => {
                assert_eq!(captured, 50);
                assert_eq!(expected, 500);
            }
        }
    }

    #[test]
    fn test_slow_device_degrades_rate_to_default() {
        let model = SignalModel::resting_alpha(250, 13);
        let options = DeviceOptions {
            pace_hz: Some(4),
            disconnect_after: None,
        };
        let device = SimulatedDevice::spawn(model, options).unwrap();
        let mut source = TcpSampleSource::connect(device.addr(), CONNECT_TIMEOUT).unwrap();

        let estimate = RateEstimator::new(1).estimate(&mut source);
        assert!(estimate.degraded);
        assert_eq!(estimate.rate_hz, DEFAULT_RATE_HZ);
    }
}
