//! Spectral band-power feature extraction
//!
//! A conditioned window maps to exactly seven numbers: the mean squared
//! spectral magnitude inside each of the five canonical EEG bands, then
//! the time-domain mean and standard deviation. The ordering is part of
//! the contract with the feature-based classifier.

use num_complex::Complex;
use rustfft::FftPlanner;
use synapse_core::{ConditionedSignal, FeatureVector};

/// A named frequency band for spectral features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBand {
    pub name: &'static str,
    pub low_hz: f32,
    pub high_hz: f32,
}

/// The canonical EEG bands, in feature-vector order
pub const EEG_BANDS: [FeatureBand; 5] = [
    FeatureBand { name: "delta", low_hz: 0.5, high_hz: 4.0 },
    FeatureBand { name: "theta", low_hz: 4.0, high_hz: 8.0 },
    FeatureBand { name: "alpha", low_hz: 8.0, high_hz: 13.0 },
    FeatureBand { name: "beta", low_hz: 13.0, high_hz: 30.0 },
    FeatureBand { name: "gamma", low_hz: 30.0, high_hz: 40.0 },
];

/// Computes the fixed-length descriptor for one conditioned window
pub struct FeatureExtractor {
    fft_planner: FftPlanner<f32>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        FeatureExtractor::new()
    }
}

impl FeatureExtractor {
    pub fn new() -> Self {
        FeatureExtractor {
            fft_planner: FftPlanner::new(),
        }
    }

    /// Extract the seven-dimensional feature vector. Deterministic:
    /// the same signal and rate always produce the same values.
    pub fn extract(&mut self, signal: &ConditionedSignal) -> FeatureVector {
        let spectrum = self.magnitude_spectrum(signal.data());
        let rate = signal.rate_hz() as f32;
        let n = signal.len();

        let mut band_powers = [0.0f32; 5];
        for (power, band) in band_powers.iter_mut().zip(EEG_BANDS.iter()) {
            *power = band_power(&spectrum, band, rate, n);
        }

        FeatureVector::new(band_powers, signal.mean(), signal.std_dev())
    }

    /// Magnitudes of the positive-frequency half of a full-length DFT
    fn magnitude_spectrum(&mut self, data: &[f32]) -> Vec<f32> {
        if data.is_empty() {
            return Vec::new();
        }

        let fft = self.fft_planner.plan_fft_forward(data.len());
        let mut buffer: Vec<Complex<f32>> =
            data.iter().map(|&x| Complex::new(x, 0.0)).collect();
        fft.process(&mut buffer);

        buffer[..=data.len() / 2].iter().map(|c| c.norm()).collect()
    }
}

/// Mean squared magnitude over bins whose frequency lies in
/// `[low, high]`; a band with no bins has zero power by definition.
fn band_power(spectrum: &[f32], band: &FeatureBand, rate_hz: f32, signal_len: usize) -> f32 {
    if signal_len == 0 {
        return 0.0;
    }
    let resolution = rate_hz / signal_len as f32;

    let mut sum = 0.0f32;
    let mut count = 0usize;
    for (i, &magnitude) in spectrum.iter().enumerate() {
        let freq = i as f32 * resolution;
        if freq >= band.low_hz && freq <= band.high_hz {
            sum += magnitude * magnitude;
            count += 1;
        }
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use synapse_core::FEATURE_DIM;

    fn tone_signal(freq: f32, rate: u32, len: usize) -> ConditionedSignal {
        let data: Vec<f32> = (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect();
        ConditionedSignal::new(data, rate)
    }

    #[test]
    fn test_output_is_always_seven_values() {
        let mut extractor = FeatureExtractor::new();
        let features = extractor.extract(&tone_signal(10.0, 250, 500));
        assert_eq!(features.values().len(), FEATURE_DIM);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let mut extractor = FeatureExtractor::new();
        let signal = tone_signal(10.0, 250, 500);
        let first = extractor.extract(&signal);
        let second = extractor.extract(&signal);
        assert_eq!(first, second);
    }

    #[test]
    fn test_band_powers_non_negative() {
        let mut extractor = FeatureExtractor::new();
        for freq in [2.0, 6.0, 10.0, 20.0, 35.0, 60.0] {
            let features = extractor.extract(&tone_signal(freq, 250, 500));
            assert!(features.band_powers().iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn test_band_power_sum_bounded_by_total_energy() {
        let mut extractor = FeatureExtractor::new();
        let signal = tone_signal(10.0, 250, 500);
        let features = extractor.extract(&signal);

        let spectrum = extractor.magnitude_spectrum(signal.data());
        let total_energy: f32 = spectrum.iter().map(|m| m * m).sum();
        let band_sum: f32 = features.band_powers().iter().sum();
        assert!(band_sum <= total_energy);
    }

    #[test]
    fn test_alpha_dominates_for_ten_hz_tone() {
        let mut extractor = FeatureExtractor::new();
        let features = extractor.extract(&tone_signal(10.0, 250, 500));
        let powers = features.band_powers();
        let alpha = powers[2];
        for (i, &power) in powers.iter().enumerate() {
            if i != 2 {
                assert!(
                    alpha > power,
                    "alpha power {} not dominant over band {} power {}",
                    alpha,
                    i,
                    power
                );
            }
        }
    }

    #[test]
    fn test_empty_band_is_zero_not_error() {
        // 8 samples at 250 Hz: resolution is 31.25 Hz, so delta through
        // beta have no bins at all
        let mut extractor = FeatureExtractor::new();
        let features = extractor.extract(&tone_signal(10.0, 250, 8));
        assert_eq!(features.band_powers()[0], 0.0);
        assert_eq!(features.band_powers()[1], 0.0);
        assert_eq!(features.band_powers()[2], 0.0);
    }

    #[test]
    fn test_mean_and_std_features_match_signal() {
        let mut extractor = FeatureExtractor::new();
        let signal = tone_signal(10.0, 250, 500);
        let features = extractor.extract(&signal);
        assert!((features.mean() - signal.mean()).abs() < 1e-6);
        assert!((features.std_dev() - signal.std_dev()).abs() < 1e-6);
    }
}
