//! Synapse-Decoder: training, persistence and real-time prediction
//!
//! Glue around the acquisition and processing crates: classifier
//! contracts, the session state store, and the operations a decoding
//! session is made of.

pub mod classifier;
pub mod session;
pub mod store;

pub use classifier::{
    resolve_prediction, CentroidClassifier, Classifier, ClassifierInput, ClassifierKind,
    RawPrediction, TemplateClassifier, TrainedModels,
};
pub use session::{RecordReport, Session, SessionConfig, TrainOutcome};
pub use store::{ExampleStore, JsonStateStore, StateStore, TrainingSet};
