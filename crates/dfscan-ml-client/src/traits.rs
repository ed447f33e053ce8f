//! Seams between the pipeline and the remote collaborators.

use std::path::Path;

use async_trait::async_trait;
use dfscan_models::{ClassificationResult, RecognitionResult};

use crate::error::MlResult;

/// Labels a single still image as Fake, Real or "No face detected!".
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn classify(&self, image: &Path) -> MlResult<ClassificationResult>;
}

/// Matches the face in an image against known identities.
///
/// "No match" is a successful [`RecognitionResult::unidentified`], not an error.
#[async_trait]
pub trait FaceRecognizer: Send + Sync {
    async fn recognize(&self, image: &Path) -> MlResult<RecognitionResult>;
}

/// Produces free-text analysis for a prompt, optionally with the media attached.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn reason(&self, prompt: &str, attachment: Option<&Path>) -> MlResult<String>;
}
