//! Conditioning pipeline configuration

use serde::{Deserialize, Serialize};
use synapse_core::{SynapseError, SynapseResult};

/// Parameters for the conditioning cascade
///
/// A config that cannot produce stable filter coefficients at the
/// session's sampling rate is a fatal configuration error; conditioning
/// never passes raw data through silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditioningConfig {
    /// Mains interference frequency to notch out (Hz)
    pub notch_hz: f32,
    /// Notch quality factor
    pub notch_q: f32,
    /// Bandpass low edge (Hz)
    pub band_low_hz: f32,
    /// Bandpass high edge (Hz)
    pub band_high_hz: f32,
    /// Bandpass filter order, must be even
    pub band_order: usize,
    /// Z-score jump magnitude above which a sample is an artifact
    pub artifact_z_threshold: f32,
    /// Guard against division by a near-zero standard deviation
    pub epsilon: f32,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        ConditioningConfig {
            notch_hz: 50.0,
            notch_q: 30.0,
            band_low_hz: 1.0,
            band_high_hz: 40.0,
            band_order: 4,
            artifact_z_threshold: 4.0,
            epsilon: 1e-8,
        }
    }
}

impl ConditioningConfig {
    /// Reject parameter combinations that are degenerate at `rate_hz`
    pub fn validate(&self, rate_hz: u32) -> SynapseResult<()> {
        if rate_hz == 0 {
            return Err(SynapseError::config("sampling rate must be at least 1 Hz"));
        }
        let nyquist = rate_hz as f32 / 2.0;

        if self.band_low_hz <= 0.0 {
            return Err(SynapseError::config(
                "bandpass low edge must be positive",
            ));
        }
        if self.band_low_hz >= self.band_high_hz {
            return Err(SynapseError::config(format!(
                "bandpass low edge {} Hz must be below high edge {} Hz",
                self.band_low_hz, self.band_high_hz
            )));
        }
        if self.band_high_hz >= nyquist {
            return Err(SynapseError::config(format!(
                "bandpass high edge {} Hz at or above Nyquist {} Hz for rate {} Hz",
                self.band_high_hz, nyquist, rate_hz
            )));
        }
        if self.notch_hz >= nyquist {
            return Err(SynapseError::config(format!(
                "notch frequency {} Hz at or above Nyquist {} Hz for rate {} Hz",
                self.notch_hz, nyquist, rate_hz
            )));
        }
        if self.notch_q <= 0.0 {
            return Err(SynapseError::config("notch quality factor must be positive"));
        }
        if self.band_order == 0 || self.band_order % 2 != 0 {
            return Err(SynapseError::config(format!(
                "bandpass order {} must be a positive even number",
                self.band_order
            )));
        }
        if self.artifact_z_threshold <= 0.0 {
            return Err(SynapseError::config(
                "artifact threshold must be positive",
            ));
        }
        if self.epsilon <= 0.0 {
            return Err(SynapseError::config("epsilon must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid_at_default_rate() {
        let config = ConditioningConfig::default();
        assert!(config.validate(250).is_ok());
    }

    #[test]
    fn test_rate_too_low_for_band_edges() {
        // Nyquist at 60 Hz is 30 Hz, below the 40 Hz edge
        let config = ConditioningConfig::default();
        let err = config.validate(60).unwrap_err();
        assert!(matches!(err, SynapseError::Configuration { .. }));
    }

    #[test]
    fn test_zero_rate_rejected() {
        let config = ConditioningConfig::default();
        assert!(config.validate(0).is_err());
    }

    #[test]
    fn test_inverted_band_edges_rejected() {
        let config = ConditioningConfig {
            band_low_hz: 40.0,
            band_high_hz: 1.0,
            ..ConditioningConfig::default()
        };
        assert!(config.validate(250).is_err());
    }

    #[test]
    fn test_odd_order_rejected() {
        let config = ConditioningConfig {
            band_order: 3,
            ..ConditioningConfig::default()
        };
        assert!(config.validate(250).is_err());
    }
}
