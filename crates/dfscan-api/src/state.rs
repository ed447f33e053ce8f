//! Application state.

use std::sync::Arc;

use dfscan_pipeline::MediaAnalyzer;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub analyzer: Arc<MediaAnalyzer>,
}

impl AppState {
    pub fn new(config: ApiConfig, analyzer: MediaAnalyzer) -> Self {
        Self {
            config,
            analyzer: Arc::new(analyzer),
        }
    }
}
