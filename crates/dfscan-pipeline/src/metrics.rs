//! Pipeline metrics.

use dfscan_media::MediaKind;
use dfscan_models::VerdictLabel;
use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const ANALYSES_TOTAL: &str = "dfscan_analyses_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "dfscan_analysis_duration_seconds";
    pub const FRAMES_SAMPLED_TOTAL: &str = "dfscan_frames_sampled_total";
    pub const FRAME_FAILURES_TOTAL: &str = "dfscan_frame_failures_total";
    pub const VERDICTS_TOTAL: &str = "dfscan_verdicts_total";
    pub const REASONER_FAILURES_TOTAL: &str = "dfscan_reasoner_failures_total";
}

/// Record one finished analysis.
pub fn record_analysis(kind: MediaKind, outcome: &'static str, duration_secs: f64) {
    let labels = [("kind", kind.as_str()), ("outcome", outcome)];
    counter!(names::ANALYSES_TOTAL, &labels).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_frames_sampled(count: usize) {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(count as u64);
}

/// Record a per-frame collaborator failure.
pub fn record_frame_failure(stage: &'static str) {
    counter!(names::FRAME_FAILURES_TOTAL, "stage" => stage).increment(1);
}

pub fn record_verdict(label: VerdictLabel) {
    counter!(names::VERDICTS_TOTAL, "label" => label.as_str()).increment(1);
}

pub fn record_reasoner_failure() {
    counter!(names::REASONER_FAILURES_TOTAL).increment(1);
}
