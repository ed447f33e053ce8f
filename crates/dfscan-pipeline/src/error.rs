//! Pipeline error types.

use std::path::PathBuf;

use dfscan_media::MediaError;
use dfscan_ml_client::{ConfigError, MlError};
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error text from a collaborator, surfaced verbatim to the caller.
    #[error(transparent)]
    Ml(#[from] MlError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedMedia(PathBuf),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }
}
