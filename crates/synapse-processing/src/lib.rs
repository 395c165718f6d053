//! Synapse-Processing: signal conditioning and feature extraction
//!
//! Notch and bandpass filtering, transient-artifact rejection,
//! normalization and spectral band-power features for EEG windows.

pub mod conditioner;
pub mod config;
pub mod features;
pub mod filters;

pub use conditioner::SignalConditioner;
pub use config::ConditioningConfig;
pub use features::{FeatureBand, FeatureExtractor};
pub use filters::{BandpassFilter, NotchFilter};
