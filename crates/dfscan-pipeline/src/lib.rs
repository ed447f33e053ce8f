//! Deepfake analysis pipeline.
//!
//! Turns an uploaded photo or video into a written verdict:
//! - [`aggregator`]: folds per-frame classifications into one verdict
//! - [`best_match`]: picks the most confident identity across frames
//! - [`composer`]: words the verdict and requests the detailed analysis
//! - [`analyzer`]: drives the above for a single request

pub mod aggregator;
pub mod analyzer;
pub mod best_match;
pub mod composer;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use aggregator::{aggregate, FrameOutcome};
pub use analyzer::MediaAnalyzer;
pub use best_match::select_best_match;
pub use composer::{format_probability, verdict_prefix, ReasoningTemplate, VerdictComposer, NO_FACE_MESSAGE};
pub use config::{AnalyzerConfig, PipelineConfig, DEFAULT_HIGH_CONFIDENCE_THRESHOLD};
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_tracing, AnalysisLogger};
