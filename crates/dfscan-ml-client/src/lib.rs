//! Clients for the remote collaborators of the analysis pipeline.
//!
//! - [`ClassifierClient`]: hosted deepfake classifier (Fake / Real / no face)
//! - [`RecognizerClient`]: face recognizer returning the best identity match
//! - [`GeminiReasoner`]: generative model producing the written analysis
//!
//! Each client enforces its own deadline and implements one of the traits in
//! [`traits`], which is what the pipeline depends on.

pub mod classifier;
pub mod config;
pub mod deadline;
pub mod error;
pub mod reasoner;
pub mod recognizer;
pub mod traits;

pub use classifier::{parse_classification, ClassifierClient};
pub use config::{ClassifierConfig, ConfigError, ConfigResult, ReasonerConfig, RecognizerConfig};
pub use error::{MlError, MlResult};
pub use reasoner::GeminiReasoner;
pub use recognizer::{parse_recognition, RecognizerClient};
pub use traits::{FaceRecognizer, ImageClassifier, Reasoner};
