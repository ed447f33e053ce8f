//! Gemini client for free-text media analysis.
//!
//! The prompt is sent with Google Search grounding enabled and, when small
//! enough, the analyzed media inlined as base64. Configured models are tried
//! in order; the first one that answers with text wins.

use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dfscan_media::mime_type;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReasonerConfig;
use crate::deadline::with_deadline;
use crate::error::{MlError, MlResult};
use crate::traits::Reasoner;

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini-backed [`Reasoner`].
pub struct GeminiReasoner {
    http: Client,
    config: ReasonerConfig,
}

impl GeminiReasoner {
    pub fn new(config: ReasonerConfig) -> MlResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    async fn generate(&self, prompt: &str, attachment: Option<&Path>) -> MlResult<String> {
        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        if let Some(path) = attachment {
            if let Some(inline) = self.inline_media(path).await? {
                parts.push(inline);
            }
        }

        let request = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        };

        let mut last_error = None;
        for model in &self.config.models {
            info!("Requesting analysis from Gemini model: {}", model);
            match self.call_model(model, &request).await {
                Ok(text) => {
                    debug!(model = %model, chars = text.len(), "Gemini analysis received");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Gemini model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MlError::remote("No Gemini models configured")))
    }

    /// Inline part for `path`, or `None` when the media can't be attached.
    async fn inline_media(&self, path: &Path) -> MlResult<Option<Part>> {
        let Some(mime) = mime_type(path) else {
            warn!(path = %path.display(), "Unknown media type, analyzing without attachment");
            return Ok(None);
        };

        let size = tokio::fs::metadata(path).await?.len();
        if size > self.config.max_inline_bytes {
            warn!(
                path = %path.display(),
                size,
                limit = self.config.max_inline_bytes,
                "Media too large to inline, analyzing without attachment"
            );
            return Ok(None);
        }

        let bytes = tokio::fs::read(path).await?;
        Ok(Some(Part::Inline {
            inline_data: InlineData {
                mime_type: mime.to_string(),
                data: STANDARD.encode(&bytes),
            },
        }))
    }

    async fn call_model(&self, model: &str, request: &GeminiRequest) -> MlResult<String> {
        let mut url = self.config.base_url.clone();
        url.set_path(&format!("v1beta/models/{}:generateContent", model));

        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MlError::remote(format!(
                "Gemini API returned {}: {}",
                status, text
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| MlError::malformed(format!("Gemini response: {}", e)))?;

        extract_text(parsed)
    }
}

#[async_trait]
impl Reasoner for GeminiReasoner {
    async fn reason(&self, prompt: &str, attachment: Option<&Path>) -> MlResult<String> {
        with_deadline(self.config.timeout, self.generate(prompt, attachment)).await
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: GeminiResponse) -> MlResult<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(MlError::malformed("No text in Gemini response"));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, models: &[&str]) -> ReasonerConfig {
        ReasonerConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri().parse().unwrap(),
            models: models.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(5),
            max_inline_bytes: 1024,
        }
    }

    fn answer(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [
                {"text": "<structured_analysis>a</structured_analysis>"},
                {"functionCall": {}},
                {"text": "\n<assessment>b</assessment>"}
            ]}}]}"#,
        )
        .unwrap();
        let text = extract_text(response).unwrap();
        assert!(text.starts_with("<structured_analysis>"));
        assert!(text.ends_with("</assessment>"));
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(MlError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: "hi".into(),
                    },
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert!(json["tools"][0]["google_search"].is_object());
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/primary:generateContent"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/backup:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(answer("analysis text"))
            .expect(1)
            .mount(&server)
            .await;

        let reasoner = GeminiReasoner::new(config(&server, &["primary", "backup"])).unwrap();
        let text = reasoner.reason("prompt", None).await.unwrap();
        assert_eq!(text, "analysis text");
    }

    #[tokio::test]
    async fn test_all_models_failing_returns_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let reasoner = GeminiReasoner::new(config(&server, &["a", "b"])).unwrap();
        let err = reasoner.reason("prompt", None).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_small_media_is_inlined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(answer("ok"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let media = dir.path().join("face.png");
        std::fs::write(&media, b"png-bytes").unwrap();

        let reasoner = GeminiReasoner::new(config(&server, &["m"])).unwrap();
        reasoner.reason("prompt", Some(&media)).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        let inline = &body["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(inline["mime_type"], "image/png");
        assert_eq!(inline["data"], STANDARD.encode(b"png-bytes"));
    }

    #[tokio::test]
    async fn test_large_media_is_not_inlined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(answer("ok"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let media = dir.path().join("clip.mp4");
        std::fs::write(&media, vec![0u8; 4096]).unwrap();

        let reasoner = GeminiReasoner::new(config(&server, &["m"])).unwrap();
        reasoner.reason("prompt", Some(&media)).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }
}
