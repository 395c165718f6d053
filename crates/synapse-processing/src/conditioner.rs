//! Signal conditioning cascade
//!
//! Fixed stage order: notch, bandpass, artifact rejection, final
//! normalization. Later stages assume the earlier ones already ran, so
//! this is one operation, not a menu of independent filters.

use synapse_core::{ConditionedSignal, SynapseResult, Window};
use tracing::debug;

use crate::config::ConditioningConfig;
use crate::filters::{BandpassFilter, NotchFilter};

/// Turns a raw window into a zero-mean, unit-variance, artifact-free
/// signal. Pure over its inputs; independent instances can run
/// concurrently on independent windows.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    config: ConditioningConfig,
}

impl Default for SignalConditioner {
    fn default() -> Self {
        SignalConditioner::new(ConditioningConfig::default())
    }
}

impl SignalConditioner {
    pub fn new(config: ConditioningConfig) -> Self {
        SignalConditioner { config }
    }

    pub fn config(&self) -> &ConditioningConfig {
        &self.config
    }

    /// Run the full cascade on one window
    ///
    /// Fails with a configuration error when the window's sampling rate
    /// cannot support the configured band edges; raw data is never
    /// passed through as if conditioned.
    pub fn condition(&self, window: &Window) -> SynapseResult<ConditionedSignal> {
        let rate_hz = window.rate_hz();
        self.config.validate(rate_hz)?;

        let notch = NotchFilter::new(self.config.notch_hz, self.config.notch_q);
        let bandpass = BandpassFilter::new(
            self.config.band_low_hz,
            self.config.band_high_hz,
            self.config.band_order,
        )?;

        let mut data = window.to_f32();
        data = notch.apply(&data, rate_hz)?;
        data = bandpass.apply(&data, rate_hz)?;
        let zeroed = self.reject_artifacts(&mut data);
        if zeroed > 0 {
            debug!(zeroed, len = data.len(), "artifact samples zeroed");
        }
        normalize(&mut data, self.config.epsilon);

        Ok(ConditionedSignal::new(data, rate_hz))
    }

    /// Zero out samples whose z-score jumps by more than the threshold
    /// between consecutive samples. Flagged samples are zeroed in place,
    /// never removed: window length is part of the downstream contract.
    /// Returns the number of samples zeroed.
    fn reject_artifacts(&self, data: &mut [f32]) -> usize {
        if data.len() < 2 {
            return 0;
        }

        let n = data.len() as f32;
        let mean = data.iter().sum::<f32>() / n;
        let std_dev =
            (data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n).sqrt();
        let denom = std_dev + self.config.epsilon;

        let z: Vec<f32> = data.iter().map(|x| (x - mean) / denom).collect();

        // First difference with the first sample prepended, so the jump
        // at index 0 is zero by construction
        let mut zeroed = 0usize;
        let mut prev = z[0];
        for (sample, &zi) in data.iter_mut().zip(z.iter()) {
            let jump = zi - prev;
            prev = zi;
            if jump.abs() >= self.config.artifact_z_threshold {
                *sample = 0.0;
                zeroed += 1;
            }
        }
        zeroed
    }
}

/// Subtract the mean and divide by the standard deviation, with an
/// epsilon guard so constant-valued input maps to zeros instead of
/// NaN or infinity.
pub fn normalize(data: &mut [f32], epsilon: f32) {
    if data.is_empty() {
        return;
    }
    let n = data.len() as f32;
    let mean = data.iter().sum::<f32>() / n;
    let std_dev = (data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n).sqrt();
    let denom = std_dev + epsilon;
    for sample in data.iter_mut() {
        *sample = (*sample - mean) / denom;
    }
}
