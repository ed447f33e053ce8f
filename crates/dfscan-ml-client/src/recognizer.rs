//! HTTP client for the face recognizer.

use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dfscan_models::RecognitionResult;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RecognizerConfig;
use crate::deadline::with_deadline;
use crate::error::{MlError, MlResult};
use crate::traits::FaceRecognizer;

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    image: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    matches: Option<Vec<IdentityMatch>>,
}

#[derive(Debug, Deserialize)]
struct IdentityMatch {
    #[serde(alias = "identity")]
    name: String,
    #[serde(alias = "accuracy", alias = "confidence")]
    similarity: f64,
}

/// Client for the remote face recognizer.
pub struct RecognizerClient {
    http: Client,
    config: RecognizerConfig,
}

impl RecognizerClient {
    pub fn new(config: RecognizerConfig) -> MlResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    async fn request(&self, image: &Path) -> MlResult<RecognitionResult> {
        let bytes = tokio::fs::read(image).await?;

        let response = self
            .http
            .post(self.config.endpoint.clone())
            .json(&RecognizeRequest {
                image: STANDARD.encode(&bytes),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(image = %image.display(), "Recognizer found no matching identity");
            return Ok(RecognitionResult::unidentified());
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MlError::remote(format!(
                "Recognizer returned {}: {}",
                status, text
            )));
        }

        let text = response.text().await?;
        let result = parse_recognition(status.as_u16(), &text)?;
        debug!(
            image = %image.display(),
            identity = %result.identity,
            similarity = result.similarity,
            "Recognizer answered"
        );
        Ok(result)
    }
}

#[async_trait]
impl FaceRecognizer for RecognizerClient {
    async fn recognize(&self, image: &Path) -> MlResult<RecognitionResult> {
        with_deadline(self.config.timeout, self.request(image)).await
    }
}

/// Best match in a successful recognizer response.
///
/// An absent or empty match list is the unidentified sentinel. Among several
/// matches the highest similarity wins, the earliest on ties.
pub fn parse_recognition(status: u16, body: &str) -> MlResult<RecognitionResult> {
    let parsed: RecognizeResponse = serde_json::from_str(body)
        .map_err(|e| MlError::malformed(format!("recognizer body: {}", e)))?;

    let matches = parsed.matches.unwrap_or_default();
    if let Some(m) = matches.iter().find(|m| !(0.0..=1.0).contains(&m.similarity)) {
        return Err(MlError::malformed(format!(
            "similarity {} out of range for '{}'",
            m.similarity, m.name
        )));
    }

    let best = matches
        .into_iter()
        .fold(None::<IdentityMatch>, |best, m| match best {
            Some(b) if b.similarity >= m.similarity => Some(b),
            _ => Some(m),
        });

    Ok(match best {
        Some(m) => RecognitionResult::new(status, m.similarity, m.name),
        None => RecognitionResult::unidentified(),
    })
}
