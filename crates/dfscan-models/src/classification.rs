//! Per-unit classification results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::label::ClassificationLabel;

/// One `(label, confidence)` pair as reported by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfidenceEntry {
    pub label: String,
    pub confidence: f64,
}

impl ConfidenceEntry {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Classification of a single image (photo or extracted frame).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    /// Validated label
    pub label: ClassificationLabel,
    /// Confidence of the top entry (`confidences[0]`)
    pub confidence: f64,
    /// All entries in the order the classifier returned them
    pub raw_confidences: Vec<ConfidenceEntry>,
}

impl ClassificationResult {
    /// Build a result whose only confidence entry matches its label.
    pub fn single(label: ClassificationLabel, confidence: f64) -> Self {
        Self {
            label,
            confidence,
            raw_confidences: vec![ConfidenceEntry::new(label.as_str(), confidence)],
        }
    }

    /// Confidence of the entry whose label matches `label` (case-insensitive).
    ///
    /// Returns `0.0` when the classifier did not report that label.
    pub fn confidence_for(&self, label: ClassificationLabel) -> f64 {
        self.raw_confidences
            .iter()
            .find(|entry| entry.label.eq_ignore_ascii_case(label.as_str()))
            .map(|entry| entry.confidence)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_for_matching_entry() {
        let result = ClassificationResult {
            label: ClassificationLabel::Fake,
            confidence: 0.7,
            raw_confidences: vec![
                ConfidenceEntry::new("Fake", 0.7),
                ConfidenceEntry::new("real", 0.3),
            ],
        };

        assert!((result.confidence_for(ClassificationLabel::Fake) - 0.7).abs() < f64::EPSILON);
        assert!((result.confidence_for(ClassificationLabel::Real) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_confidence_for_missing_entry_defaults_to_zero() {
        let result = ClassificationResult::single(ClassificationLabel::Real, 0.9);
        assert_eq!(result.confidence_for(ClassificationLabel::Fake), 0.0);
    }
}
