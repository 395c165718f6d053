//! Synapse-Core: Foundation types for the EEG decoding pipeline
//!
//! Raw windows, conditioned signals, feature vectors, label mapping
//! and the shared error taxonomy.

pub mod error;
pub mod labels;
pub mod signal;
pub mod window;

pub use error::{SynapseError, SynapseResult};
pub use labels::{LabelSet, Prediction};
pub use signal::{ConditionedSignal, FeatureVector, FEATURE_DIM};
pub use window::{
    CaptureOutcome, Sample, Window, WindowBuilder, COMPLETENESS_THRESHOLD, DEFAULT_RATE_HZ,
    MIN_USABLE_RATE_HZ,
};
