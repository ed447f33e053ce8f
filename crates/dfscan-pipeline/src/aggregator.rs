//! Per-frame classification aggregation.
//!
//! Frames without a face don't vote. Among the rest the majority label wins
//! by frame count, with ties going to Real; confidence is the mean of the
//! winning group. The fold is commutative: group sums are taken over sorted
//! values, so any permutation of the input gives a bit-identical verdict.

use dfscan_models::{
    AggregateVerdict, ClassConfidence, ClassificationLabel, ClassificationResult,
    FrameAnalysisSummary, VerdictLabel,
};

/// Outcome of classifying one frame.
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    Classified(ClassificationResult),
    /// The classifier call failed (transport error or timeout)
    Failed(String),
}

/// Fold per-frame outcomes into a single verdict.
pub fn aggregate(outcomes: &[FrameOutcome]) -> AggregateVerdict {
    let mut fake_confidences = Vec::new();
    let mut real_confidences = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            FrameOutcome::Classified(result) => match result.label {
                ClassificationLabel::NoFaceDetected => {}
                ClassificationLabel::Fake => {
                    fake_confidences.push(result.confidence_for(ClassificationLabel::Fake))
                }
                ClassificationLabel::Real => {
                    real_confidences.push(result.confidence_for(ClassificationLabel::Real))
                }
            },
            FrameOutcome::Failed(reason) => failures.push(reason.as_str()),
        }
    }

    let summary = FrameAnalysisSummary {
        total_frames: outcomes.len(),
        frames_with_faces: fake_confidences.len() + real_confidences.len(),
        fake_frame_count: fake_confidences.len(),
        real_frame_count: real_confidences.len(),
        failed_frame_count: failures.len(),
    };

    if !outcomes.is_empty() && failures.len() == outcomes.len() {
        failures.sort_unstable();
        failures.dedup();
        return AggregateVerdict::error(
            summary,
            format!(
                "Classification failed for all {} frames: {}",
                outcomes.len(),
                failures.join("; ")
            ),
        );
    }

    if summary.frames_with_faces == 0 {
        return AggregateVerdict::no_face(summary);
    }

    let fake_mean = sorted_mean(&mut fake_confidences);
    let real_mean = sorted_mean(&mut real_confidences);

    let (label, confidence) = if summary.fake_frame_count > summary.real_frame_count {
        (VerdictLabel::Fake, fake_mean)
    } else {
        (VerdictLabel::Real, real_mean)
    };

    AggregateVerdict {
        label,
        confidence,
        per_class_confidence: ClassConfidence {
            fake: fake_mean,
            real: real_mean,
        },
        summary,
        diagnostic: None,
    }
}

/// Mean of `values` summed in ascending order; 0 for an empty group.
fn sorted_mean(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(f64::total_cmp);
    values.iter().sum::<f64>() / values.len() as f64
}
