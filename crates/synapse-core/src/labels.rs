//! Label mapping shared between training and prediction

use crate::error::{SynapseError, SynapseResult};
use serde::{Deserialize, Serialize};

/// Ordered set of distinct class labels
///
/// Index position is the class identity contract shared with any
/// classifier: a model trained against one label set must only ever be
/// asked to predict against the same set, loaded unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Build a label set from class names, dropping duplicates while
    /// preserving first-seen order
    pub fn new(labels: impl IntoIterator<Item = String>) -> Self {
        let mut seen = Vec::new();
        for label in labels {
            if !seen.contains(&label) {
                seen.push(label);
            }
        }
        LabelSet { labels: seen }
    }

    /// All labels in index order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no classes are known
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index of a label, if present
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Resolve a class index to its label
    ///
    /// An out-of-range index means the classifier and label set are out
    /// of sync, which must never produce a silently wrong label.
    pub fn label_for(&self, index: usize) -> SynapseResult<&str> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(SynapseError::ClassIndexOutOfRange {
                index,
                label_count: self.labels.len(),
            })
    }
}

/// A resolved prediction: label plus classifier-reported confidence
///
/// Confidence is in `[0,1]` but is not comparable across classifier
/// variants; feature-based models report a fixed nominal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Prediction {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_ordering_preserved() {
        let set = LabelSet::new(["b", "a", "c"].map(String::from));
        assert_eq!(set.labels(), &["b", "a", "c"]);
        assert_eq!(set.index_of("a"), Some(1));
    }

    #[test]
    fn test_duplicates_dropped() {
        let set = LabelSet::new(["a", "b", "a"].map(String::from));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_out_of_range_index_fails() {
        let set = LabelSet::new(["a"].map(String::from));
        assert_eq!(set.label_for(0).unwrap(), "a");
        let err = set.label_for(1).unwrap_err();
        match err {
            SynapseError::ClassIndexOutOfRange { index, label_count } => {
                assert_eq!(index, 1);
                assert_eq!(label_count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prediction_confidence_clamped() {
        let p = Prediction::new("x", 1.7);
        assert_eq!(p.confidence, 1.0);
    }
}
