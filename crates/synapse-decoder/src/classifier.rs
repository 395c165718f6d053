//! Classifier contracts and the built-in reference models
//!
//! The pipeline is polymorphic over one capability: map an input to a
//! class index plus a confidence. Which variant runs is an explicit
//! per-call choice, never ambient process state. Confidences are not
//! comparable across variants: the feature-based model reports a fixed
//! nominal value, the sequence-based model true softmax mass.

use serde::{Deserialize, Serialize};
use synapse_core::{
    ConditionedSignal, FeatureVector, LabelSet, Prediction, SynapseError, SynapseResult,
};

/// Nominal confidence reported by models that do not calibrate one
const NOMINAL_CONFIDENCE: f32 = 1.0;

/// Which classifier variant a prediction call should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierKind {
    /// Consumes the 7-dimensional feature vector
    Feature,
    /// Consumes the full conditioned window as a time series
    Sequence,
}

/// Input handed to a classifier
#[derive(Debug)]
pub enum ClassifierInput<'a> {
    Features(&'a FeatureVector),
    Sequence(&'a ConditionedSignal),
}

/// Unresolved classifier output: an index into some label set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    pub class_index: usize,
    pub confidence: f32,
}

/// The single capability both classifier variants implement
pub trait Classifier {
    /// Predict a class index and confidence for one input
    fn predict(&self, input: &ClassifierInput<'_>) -> SynapseResult<RawPrediction>;

    /// False until the model has been fitted to at least one class
    fn is_trained(&self) -> bool;
}

/// Resolve a raw prediction against a label set
///
/// The label set is checked before the classifier is invoked at all: an
/// empty mapping means nothing was ever trained, and running a model
/// against it could only produce a meaningless index.
pub fn resolve_prediction(
    labels: &LabelSet,
    classifier: &dyn Classifier,
    input: &ClassifierInput<'_>,
) -> SynapseResult<Prediction> {
    if labels.is_empty() {
        return Err(SynapseError::NotTrained { what: "label set" });
    }
    let raw = classifier.predict(input)?;
    let label = labels.label_for(raw.class_index)?;
    Ok(Prediction::new(label, raw.confidence))
}

/// Feature-based variant: nearest class centroid in feature space
///
/// Confidence is the fixed nominal value; this family of model does not
/// produce a calibrated probability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentroidClassifier {
    centroids: Vec<FeatureVector>,
}

impl CentroidClassifier {
    /// Fit one centroid per class from labeled feature vectors
    pub fn fit(examples: &[(FeatureVector, usize)], class_count: usize) -> SynapseResult<Self> {
        if class_count == 0 || examples.is_empty() {
            return Err(SynapseError::NotTrained {
                what: "feature training examples",
            });
        }

        let dim = synapse_core::FEATURE_DIM;
        let mut sums = vec![[0.0f32; synapse_core::FEATURE_DIM]; class_count];
        let mut counts = vec![0usize; class_count];

        for (features, class) in examples {
            if *class >= class_count {
                return Err(SynapseError::ClassIndexOutOfRange {
                    index: *class,
                    label_count: class_count,
                });
            }
            for d in 0..dim {
                sums[*class][d] += features.values()[d];
            }
            counts[*class] += 1;
        }

        let mut centroids = Vec::with_capacity(class_count);
        for (sum, count) in sums.iter().zip(counts.iter()) {
            if *count == 0 {
                return Err(SynapseError::NotTrained {
                    what: "examples for every class",
                });
            }
            let mut mean = *sum;
            for value in mean.iter_mut() {
                *value /= *count as f32;
            }
            centroids.push(FeatureVector::new(
                [mean[0], mean[1], mean[2], mean[3], mean[4]],
                mean[5],
                mean[6],
            ));
        }

        Ok(CentroidClassifier { centroids })
    }
}

impl Classifier for CentroidClassifier {
    fn predict(&self, input: &ClassifierInput<'_>) -> SynapseResult<RawPrediction> {
        if self.centroids.is_empty() {
            return Err(SynapseError::NotTrained {
                what: "feature model",
            });
        }
        let features = match input {
            ClassifierInput::Features(f) => *f,
            ClassifierInput::Sequence(_) => {
                return Err(SynapseError::config(
                    "feature classifier received a sequence input",
                ))
            }
        };

        let mut best = 0usize;
        let mut best_distance = f32::INFINITY;
        for (index, centroid) in self.centroids.iter().enumerate() {
            let distance = features.distance(centroid);
            if distance < best_distance {
                best_distance = distance;
                best = index;
            }
        }

        Ok(RawPrediction {
            class_index: best,
            confidence: NOMINAL_CONFIDENCE,
        })
    }

    fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }
}

/// Sequence-based variant: per-class mean template matching with a
/// softmax over negative distances
///
/// Confidence is the probability mass of the winning class, so it is a
/// true probability unlike the feature variant's nominal value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateClassifier {
    templates: Vec<Vec<f32>>,
}

impl TemplateClassifier {
    /// Fit one mean template per class from conditioned signals
    pub fn fit(examples: &[(ConditionedSignal, usize)], class_count: usize) -> SynapseResult<Self> {
        if class_count == 0 || examples.is_empty() {
            return Err(SynapseError::NotTrained {
                what: "sequence training examples",
            });
        }

        let len = examples[0].0.len();
        let mut sums = vec![vec![0.0f32; len]; class_count];
        let mut counts = vec![0usize; class_count];

        for (signal, class) in examples {
            if *class >= class_count {
                return Err(SynapseError::ClassIndexOutOfRange {
                    index: *class,
                    label_count: class_count,
                });
            }
            if signal.len() != len {
                return Err(SynapseError::config(format!(
                    "sequence example length {} differs from {}",
                    signal.len(),
                    len
                )));
            }
            for (sum, value) in sums[*class].iter_mut().zip(signal.data()) {
                *sum += value;
            }
            counts[*class] += 1;
        }

        let mut templates = Vec::with_capacity(class_count);
        for (sum, count) in sums.into_iter().zip(counts.iter()) {
            if *count == 0 {
                return Err(SynapseError::NotTrained {
                    what: "examples for every class",
                });
            }
            templates.push(sum.into_iter().map(|v| v / *count as f32).collect());
        }

        Ok(TemplateClassifier { templates })
    }

    /// Mean squared distance between a signal and one template
    fn distance(template: &[f32], signal: &ConditionedSignal) -> f32 {
        let n = template.len().min(signal.len()).max(1);
        template
            .iter()
            .zip(signal.data())
            .map(|(t, s)| (t - s).powi(2))
            .sum::<f32>()
            / n as f32
    }
}

impl Classifier for TemplateClassifier {
    fn predict(&self, input: &ClassifierInput<'_>) -> SynapseResult<RawPrediction> {
        if self.templates.is_empty() {
            return Err(SynapseError::NotTrained {
                what: "sequence model",
            });
        }
        let signal = match input {
            ClassifierInput::Sequence(s) => *s,
            ClassifierInput::Features(_) => {
                return Err(SynapseError::config(
                    "sequence classifier received a feature input",
                ))
            }
        };

        // Softmax over negative distances, shifted for stability
        let scores: Vec<f32> = self
            .templates
            .iter()
            .map(|template| -Self::distance(template, signal))
            .collect();
        let max_score = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = scores.iter().map(|s| (s - max_score).exp()).collect();
        let total: f32 = exps.iter().sum();

        let mut best = 0usize;
        let mut best_mass = 0.0f32;
        for (index, &mass) in exps.iter().enumerate() {
            if mass > best_mass {
                best_mass = mass;
                best = index;
            }
        }

        Ok(RawPrediction {
            class_index: best,
            confidence: best_mass / total,
        })
    }

    fn is_trained(&self) -> bool {
        !self.templates.is_empty()
    }
}

/// Both fitted variants, persisted together after a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModels {
    pub centroid: CentroidClassifier,
    pub template: TemplateClassifier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingClassifier {
        calls: Cell<usize>,
    }

    impl Classifier for CountingClassifier {
        fn predict(&self, _input: &ClassifierInput<'_>) -> SynapseResult<RawPrediction> {
            self.calls.set(self.calls.get() + 1);
            Ok(RawPrediction {
                class_index: 0,
                confidence: 1.0,
            })
        }

        fn is_trained(&self) -> bool {
            true
        }
    }

    fn feature(values: [f32; 5], mean: f32, std: f32) -> FeatureVector {
        FeatureVector::new(values, mean, std)
    }

    #[test]
    fn test_empty_label_set_skips_classifier_entirely() {
        let classifier = CountingClassifier {
            calls: Cell::new(0),
        };
        let features = feature([1.0; 5], 0.0, 1.0);
        let err = resolve_prediction(
            &LabelSet::default(),
            &classifier,
            &ClassifierInput::Features(&features),
        )
        .unwrap_err();

        assert!(matches!(err, SynapseError::NotTrained { .. }));
        assert_eq!(classifier.calls.get(), 0);
    }

    #[test]
    fn test_centroid_classifier_separates_classes() {
        let examples = vec![
            (feature([10.0, 0.0, 0.0, 0.0, 0.0], 0.0, 1.0), 0),
            (feature([12.0, 0.0, 0.0, 0.0, 0.0], 0.0, 1.0), 0),
            (feature([0.0, 0.0, 10.0, 0.0, 0.0], 0.0, 1.0), 1),
            (feature([0.0, 0.0, 12.0, 0.0, 0.0], 0.0, 1.0), 1),
        ];
        let model = CentroidClassifier::fit(&examples, 2).unwrap();

        let probe = feature([0.0, 0.0, 11.0, 0.0, 0.0], 0.0, 1.0);
        let raw = model
            .predict(&ClassifierInput::Features(&probe))
            .unwrap();
        assert_eq!(raw.class_index, 1);
        assert_eq!(raw.confidence, NOMINAL_CONFIDENCE);
    }

    #[test]
    fn test_centroid_rejects_sequence_input() {
        let examples = vec![(feature([1.0; 5], 0.0, 1.0), 0)];
        let model = CentroidClassifier::fit(&examples, 1).unwrap();
        let signal = ConditionedSignal::new(vec![0.0; 16], 250);
        let err = model
            .predict(&ClassifierInput::Sequence(&signal))
            .unwrap_err();
        assert!(matches!(err, SynapseError::Configuration { .. }));
    }

    #[test]
    fn test_untrained_models_report_not_trained() {
        let features = feature([1.0; 5], 0.0, 1.0);
        let err = CentroidClassifier::default()
            .predict(&ClassifierInput::Features(&features))
            .unwrap_err();
        assert!(matches!(err, SynapseError::NotTrained { .. }));

        let signal = ConditionedSignal::new(vec![0.0; 16], 250);
        let err = TemplateClassifier::default()
            .predict(&ClassifierInput::Sequence(&signal))
            .unwrap_err();
        assert!(matches!(err, SynapseError::NotTrained { .. }));
    }

    #[test]
    fn test_template_confidence_is_probability_mass() {
        let a = ConditionedSignal::new(vec![1.0; 32], 250);
        let b = ConditionedSignal::new(vec![-1.0; 32], 250);
        let model =
            TemplateClassifier::fit(&[(a.clone(), 0), (b.clone(), 1)], 2).unwrap();

        let raw = model.predict(&ClassifierInput::Sequence(&a)).unwrap();
        assert_eq!(raw.class_index, 0);
        assert!(raw.confidence > 0.5);
        assert!(raw.confidence <= 1.0);
    }

    #[test]
    fn test_fit_requires_examples_for_every_class() {
        let examples = vec![(feature([1.0; 5], 0.0, 1.0), 0)];
        assert!(CentroidClassifier::fit(&examples, 2).is_err());
    }

    #[test]
    fn test_out_of_range_training_class_rejected() {
        let examples = vec![(feature([1.0; 5], 0.0, 1.0), 3)];
        let err = CentroidClassifier::fit(&examples, 2).unwrap_err();
        assert!(matches!(err, SynapseError::ClassIndexOutOfRange { .. }));
    }
}
