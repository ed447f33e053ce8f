//! Shared data models for dfscan.
//!
//! This crate provides Serde-serializable types for:
//! - Classifier labels and per-unit classification results
//! - Face recognition results and the unidentified sentinel
//! - Aggregate verdicts with frame analysis summaries
//! - The `{result}` / `{error}` response envelope

pub mod classification;
pub mod label;
pub mod recognition;
pub mod response;
pub mod verdict;

// Re-export common types
pub use classification::{ClassificationResult, ConfidenceEntry};
pub use label::{ClassificationLabel, UnexpectedLabel, VerdictLabel};
pub use recognition::{BestMatch, RecognitionResult, UNIDENTIFIED};
pub use response::AnalysisResponse;
pub use verdict::{AggregateVerdict, ClassConfidence, FrameAnalysisSummary};
