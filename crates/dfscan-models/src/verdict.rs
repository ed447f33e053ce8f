//! Aggregate verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classification::ClassificationResult;
use crate::label::{ClassificationLabel, VerdictLabel};

/// Frame counts attached to a verdict for observability.
///
/// Never feeds back into the decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameAnalysisSummary {
    /// Frames handed to the classifier
    pub total_frames: usize,
    /// Frames that took part in voting
    pub frames_with_faces: usize,
    pub fake_frame_count: usize,
    pub real_frame_count: usize,
    /// Frames whose classifier call failed
    #[serde(default)]
    pub failed_frame_count: usize,
}

/// Mean confidence of each voting group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassConfidence {
    pub fake: f64,
    pub real: f64,
}

/// Final classification of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateVerdict {
    pub label: VerdictLabel,
    /// Mean confidence of the winning group
    pub confidence: f64,
    pub per_class_confidence: ClassConfidence,
    pub summary: FrameAnalysisSummary,
    /// Diagnostic text, set for [`VerdictLabel::Error`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl AggregateVerdict {
    /// Use a single-image classification directly as the verdict.
    pub fn from_single(result: &ClassificationResult) -> Self {
        let has_face = result.label.has_face();
        let summary = FrameAnalysisSummary {
            total_frames: 1,
            frames_with_faces: usize::from(has_face),
            fake_frame_count: usize::from(result.label == ClassificationLabel::Fake),
            real_frame_count: usize::from(result.label == ClassificationLabel::Real),
            failed_frame_count: 0,
        };

        Self {
            label: result.label.into(),
            confidence: result.confidence,
            per_class_confidence: ClassConfidence {
                fake: result.confidence_for(ClassificationLabel::Fake),
                real: result.confidence_for(ClassificationLabel::Real),
            },
            summary,
            diagnostic: None,
        }
    }

    /// Verdict for media with no voting frames.
    pub fn no_face(summary: FrameAnalysisSummary) -> Self {
        Self {
            label: VerdictLabel::NoFaceDetected,
            confidence: 0.0,
            per_class_confidence: ClassConfidence::default(),
            summary,
            diagnostic: None,
        }
    }

    /// Verdict for media where every frame failed classification.
    pub fn error(summary: FrameAnalysisSummary, diagnostic: impl Into<String>) -> Self {
        Self {
            label: VerdictLabel::Error,
            confidence: 0.0,
            per_class_confidence: ClassConfidence::default(),
            summary,
            diagnostic: Some(diagnostic.into()),
        }
    }

    /// Confidence strictly above `threshold`.
    pub fn is_high_confidence(&self, threshold: f64) -> bool {
        self.confidence > threshold
    }
}
