//! Structured request logging.

use dfscan_media::MediaKind;
use tracing::{info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Install the global subscriber: JSON when `LOG_FORMAT=json`, ANSI otherwise.
///
/// `RUST_LOG` directives are honored; `dfscan=info` is always added.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "dfscan=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Per-request logger carrying the request id and media kind on every line.
#[derive(Debug, Clone)]
pub struct AnalysisLogger {
    request_id: String,
    media_kind: MediaKind,
}

impl AnalysisLogger {
    /// Logger with a freshly generated request id.
    pub fn new(media_kind: MediaKind) -> Self {
        Self::with_request_id(Uuid::new_v4().to_string(), media_kind)
    }

    pub fn with_request_id(request_id: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            request_id: request_id.into(),
            media_kind,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            media_kind = %self.media_kind,
            "Analysis started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            media_kind = %self.media_kind,
            "Analysis progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            media_kind = %self.media_kind,
            "Analysis warning: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            media_kind = %self.media_kind,
            "Analysis completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    /// Span for instrumenting the request's futures.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "analysis",
            request_id = %self.request_id,
            media_kind = %self.media_kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_generates_request_id() {
        let a = AnalysisLogger::new(MediaKind::Video);
        let b = AnalysisLogger::new(MediaKind::Video);
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.media_kind(), MediaKind::Video);
    }

    #[test]
    fn test_logger_with_request_id() {
        let logger = AnalysisLogger::with_request_id("req-42", MediaKind::Image);
        assert_eq!(logger.request_id(), "req-42");
        assert_eq!(logger.media_kind(), MediaKind::Image);
    }
}
