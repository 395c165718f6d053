//! Conditioned signals and feature vectors

use serde::{Deserialize, Serialize};

/// Number of entries in a feature vector: five band powers plus the
/// time-domain mean and standard deviation
pub const FEATURE_DIM: usize = 7;

/// Clean single-channel signal produced by the conditioning pipeline
///
/// Zero-mean, unit-variance up to the epsilon guard, artifact-suppressed.
/// Derived from exactly one window and one sampling rate; immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionedSignal {
    data: Vec<f32>,
    rate_hz: u32,
}

impl ConditionedSignal {
    /// Wrap conditioned sample data. Only the conditioning pipeline
    /// should construct these; the invariants are its responsibility.
    pub fn new(data: Vec<f32>, rate_hz: u32) -> Self {
        ConditionedSignal { data, rate_hz }
    }

    /// Conditioned sample values
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sampling rate the signal was conditioned at
    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the signal holds no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Arithmetic mean of the signal
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }

    /// Population standard deviation of the signal
    pub fn std_dev(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .data
            .iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f32>()
            / self.data.len() as f32;
        variance.sqrt()
    }
}

/// Fixed-order spectral and statistical descriptor of a conditioned window
///
/// Order is part of the contract with any feature-based classifier:
/// delta, theta, alpha, beta, gamma band powers, then mean and std.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f32; FEATURE_DIM],
}

impl FeatureVector {
    /// Assemble a feature vector from its components in contract order
    pub fn new(band_powers: [f32; 5], mean: f32, std_dev: f32) -> Self {
        let mut values = [0.0; FEATURE_DIM];
        values[..5].copy_from_slice(&band_powers);
        values[5] = mean;
        values[6] = std_dev;
        FeatureVector { values }
    }

    /// All seven values in contract order
    pub fn values(&self) -> &[f32; FEATURE_DIM] {
        &self.values
    }

    /// The five band-power entries
    pub fn band_powers(&self) -> &[f32] {
        &self.values[..5]
    }

    /// Time-domain mean entry
    pub fn mean(&self) -> f32 {
        self.values[5]
    }

    /// Time-domain standard deviation entry
    pub fn std_dev(&self) -> f32 {
        self.values[6]
    }

    /// Euclidean distance to another feature vector
    pub fn distance(&self, other: &FeatureVector) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_order() {
        let fv = FeatureVector::new([1.0, 2.0, 3.0, 4.0, 5.0], 0.5, 1.5);
        assert_eq!(fv.values(), &[1.0, 2.0, 3.0, 4.0, 5.0, 0.5, 1.5]);
        assert_eq!(fv.band_powers(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(fv.mean(), 0.5);
        assert_eq!(fv.std_dev(), 1.5);
    }

    #[test]
    fn test_feature_distance() {
        let a = FeatureVector::new([0.0; 5], 0.0, 0.0);
        let b = FeatureVector::new([3.0, 4.0, 0.0, 0.0, 0.0], 0.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_conditioned_signal_stats() {
        let signal = ConditionedSignal::new(vec![-1.0, 1.0, -1.0, 1.0], 250);
        assert_eq!(signal.len(), 4);
        assert!((signal.mean()).abs() < 1e-7);
        assert!((signal.std_dev() - 1.0).abs() < 1e-6);
    }
}
