//! HTTP client for the hosted deepfake classifier.

use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dfscan_models::{ClassificationLabel, ClassificationResult, ConfidenceEntry};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::deadline::with_deadline;
use crate::error::{MlError, MlResult};
use crate::traits::ImageClassifier;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    image: String,
    model: &'a str,
}

/// Client for the remote image classifier.
pub struct ClassifierClient {
    http: Client,
    config: ClassifierConfig,
}

impl ClassifierClient {
    pub fn new(config: ClassifierConfig) -> MlResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    async fn request(&self, image: &Path) -> MlResult<ClassificationResult> {
        let bytes = tokio::fs::read(image).await?;
        let body = ClassifyRequest {
            image: STANDARD.encode(&bytes),
            model: &self.config.model,
        };

        debug!(
            image = %image.display(),
            bytes = bytes.len(),
            model = %self.config.model,
            "Sending classification request"
        );

        let response = self
            .http
            .post(self.config.endpoint.clone())
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MlError::remote(format!(
                "Classifier returned {}: {}",
                status, text
            )));
        }

        let text = response.text().await?;
        parse_classification(&text)
    }
}

#[async_trait]
impl ImageClassifier for ClassifierClient {
    async fn classify(&self, image: &Path) -> MlResult<ClassificationResult> {
        with_deadline(self.config.timeout, self.request(image)).await
    }
}

/// Interpret a classifier response body.
///
/// Accepts the bare `{label, confidences}` object, or the same object as the
/// first element of a `data` array or a top-level array. The label must be one
/// of the three known labels and `confidences[0].confidence` must be present.
pub fn parse_classification(body: &str) -> MlResult<ClassificationResult> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| MlError::malformed(format!("classifier body is not JSON: {}", e)))?;
    let payload = unwrap_payload(&root);

    let label = payload
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| MlError::malformed("missing `label`"))?;

    let entries = payload
        .get("confidences")
        .and_then(Value::as_array)
        .ok_or_else(|| MlError::malformed("missing `confidences`"))?;

    let raw_confidences = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i, entry))
        .collect::<MlResult<Vec<_>>>()?;

    let confidence = raw_confidences
        .first()
        .map(|e| e.confidence)
        .ok_or_else(|| MlError::malformed("missing `confidences[0].confidence`"))?;

    let label: ClassificationLabel = label.parse()?;

    Ok(ClassificationResult {
        label,
        confidence,
        raw_confidences,
    })
}

fn unwrap_payload(root: &Value) -> &Value {
    if let Some(first) = root.get("data").and_then(Value::as_array).and_then(|d| d.first()) {
        return first;
    }
    if let Some(first) = root.as_array().and_then(|a| a.first()) {
        return first;
    }
    root
}

fn parse_entry(index: usize, entry: &Value) -> MlResult<ConfidenceEntry> {
    let label = entry
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| MlError::malformed(format!("missing `confidences[{}].label`", index)))?;
    let confidence = entry
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            MlError::malformed(format!("missing `confidences[{}].confidence`", index))
        })?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(MlError::malformed(format!(
            "confidence {} out of range for '{}'",
            confidence, label
        )));
    }

    Ok(ConfidenceEntry::new(label, confidence))
}
