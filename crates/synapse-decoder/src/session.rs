//! Decoding session: the operations an operator drives
//!
//! One struct owns the capture, conditioning and classification stages
//! plus the storage contracts, and exposes the session verbs: calibrate
//! the sampling rate, record labeled examples, train the models, and
//! predict live. Every verb opens its own connection to the device and
//! closes it when done; no socket outlives an operation.

use std::net::SocketAddr;
use std::time::Duration;

use synapse_acquisition::{RateEstimate, RateEstimator, TcpSampleSource, WindowCapturer};
use synapse_core::{CaptureOutcome, Prediction, SynapseError, SynapseResult, Window};
use synapse_processing::{ConditioningConfig, FeatureExtractor, SignalConditioner};
use tracing::{info, warn};

use crate::classifier::{
    resolve_prediction, CentroidClassifier, ClassifierInput, ClassifierKind, TemplateClassifier,
    TrainedModels,
};
use crate::store::{ExampleStore, StateStore};

/// Session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device endpoint serving the raw byte stream
    pub device_addr: SocketAddr,
    /// Window length in wall-clock seconds
    pub duration_secs: u32,
    /// Calibration interval in wall-clock seconds
    pub calibration_secs: u32,
    /// Connect timeout for each operation's connection
    pub connect_timeout: Duration,
}

impl SessionConfig {
    pub fn new(device_addr: SocketAddr) -> Self {
        SessionConfig {
            device_addr,
            duration_secs: 2,
            calibration_secs: 2,
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Outcome of a recording run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordReport {
    /// Windows captured complete and saved
    pub saved: usize,
    /// Windows skipped because the capture fell below the threshold
    pub skipped: usize,
}

/// Outcome of a training run
#[derive(Debug)]
pub enum TrainOutcome {
    /// Both models fitted and persisted
    Trained {
        class_count: usize,
        example_count: usize,
    },
    /// The example store holds nothing usable; prior state untouched
    NoExamples,
}

/// A decoding session bound to one device endpoint and one state store
pub struct Session<S: StateStore> {
    config: SessionConfig,
    state: S,
    examples: ExampleStore,
    conditioner: SignalConditioner,
    extractor: FeatureExtractor,
    capturer: WindowCapturer,
}

impl<S: StateStore> Session<S> {
    pub fn new(config: SessionConfig, state: S, examples: ExampleStore) -> Self {
        Session {
            config,
            state,
            examples,
            conditioner: SignalConditioner::new(ConditioningConfig::default()),
            extractor: FeatureExtractor::new(),
            capturer: WindowCapturer::new(),
        }
    }

    fn connect(&self) -> SynapseResult<TcpSampleSource> {
        TcpSampleSource::connect(self.config.device_addr, self.config.connect_timeout)
    }

    fn expected_samples(&self, rate_hz: u32) -> usize {
        (rate_hz as usize) * (self.config.duration_secs as usize)
    }

    /// Measure the device's effective sampling rate and persist it
    ///
    /// Calibration never fails hard: an unreachable device degrades to
    /// the default rate, and that degraded rate is what gets persisted.
    pub fn calibrate(&self) -> SynapseResult<RateEstimate> {
        let estimate = RateEstimator::new(self.config.calibration_secs)
            .estimate_endpoint(self.config.device_addr);
        self.state.save_rate(estimate.rate_hz)?;
        info!(
            rate_hz = estimate.rate_hz,
            degraded = estimate.degraded,
            "sampling rate calibrated"
        );
        Ok(estimate)
    }

    /// Record `repeats` windows for one class label over a single
    /// connection. Incomplete captures are skipped with a warning and
    /// counted; a run that saves nothing is still a successful run.
    pub fn record(&self, label: &str, repeats: usize) -> SynapseResult<RecordReport> {
        let rate_hz = self.state.load_rate()?;
        let mut source = self.connect()?;
        let mut report = RecordReport {
            saved: 0,
            skipped: 0,
        };

        for _ in 0..repeats {
            match self
                .capturer
                .capture(&mut source, rate_hz, self.config.duration_secs)
            {
                CaptureOutcome::Complete(window) => {
                    let path = self.examples.save_example(label, &window)?;
                    info!(label, file = %path.display(), "example saved");
                    report.saved += 1;
                }
                CaptureOutcome::Incomplete { captured, expected } => {
                    warn!(label, captured, expected, "skipping incomplete capture");
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }

    /// Fit both classifier variants from the stored examples and
    /// persist the models alongside the label set they index into
    pub fn train(&mut self) -> SynapseResult<TrainOutcome> {
        let rate_hz = self.state.load_rate()?;
        let expected = self.expected_samples(rate_hz);
        let set = self.examples.load_training_set(rate_hz, expected)?;

        if set.examples.is_empty() {
            warn!("no usable examples recorded, nothing to train");
            return Ok(TrainOutcome::NoExamples);
        }

        let mut feature_examples = Vec::with_capacity(set.examples.len());
        let mut sequence_examples = Vec::with_capacity(set.examples.len());
        for (window, class) in &set.examples {
            let signal = self.conditioner.condition(window)?;
            feature_examples.push((self.extractor.extract(&signal), *class));
            sequence_examples.push((signal, *class));
        }

        let models = TrainedModels {
            centroid: CentroidClassifier::fit(&feature_examples, set.labels.len())?,
            template: TemplateClassifier::fit(&sequence_examples, set.labels.len())?,
        };

        self.state.save_models(&models)?;
        self.state.save_labels(&set.labels)?;
        self.state.save_rate(rate_hz)?;

        info!(
            classes = set.labels.len(),
            examples = set.examples.len(),
            "models trained"
        );
        Ok(TrainOutcome::Trained {
            class_count: set.labels.len(),
            example_count: set.examples.len(),
        })
    }

    /// Capture one live window and classify it with the chosen variant
    ///
    /// The label set is checked before any capture happens: an untrained
    /// session must fail fast, not spend a window's worth of wall-clock
    /// time first. The resolved label is appended to the history log.
    pub fn predict(&mut self, kind: ClassifierKind) -> SynapseResult<Prediction> {
        let labels = self.state.load_labels()?;
        if labels.is_empty() {
            return Err(SynapseError::NotTrained { what: "label set" });
        }
        let models = self
            .state
            .load_models()?
            .ok_or(SynapseError::NotTrained { what: "models" })?;

        let rate_hz = self.state.load_rate()?;
        let window = self.capture_live(rate_hz)?;
        let signal = self.conditioner.condition(&window)?;

        let prediction = match kind {
            ClassifierKind::Feature => {
                let features = self.extractor.extract(&signal);
                resolve_prediction(&labels, &models.centroid, &ClassifierInput::Features(&features))?
            }
            ClassifierKind::Sequence => resolve_prediction(
                &labels,
                &models.template,
                &ClassifierInput::Sequence(&signal),
            )?,
        };

        self.state.append_history(&prediction.label)?;
        info!(
            label = %prediction.label,
            confidence = prediction.confidence,
            "prediction resolved"
        );
        Ok(prediction)
    }

    fn capture_live(&self, rate_hz: u32) -> SynapseResult<Window> {
        let mut source = self.connect()?;
        self.capturer
            .capture_window(&mut source, rate_hz, self.config.duration_secs)
    }

    /// Reset the prediction history log
    pub fn clear_history(&self) -> SynapseResult<()> {
        self.state.clear_history()
    }

    /// The state store backing this session
    pub fn state(&self) -> &S {
        &self.state
    }
}
