//! Remote collaborator error types.

use std::time::Duration;

use dfscan_models::UnexpectedLabel;
use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    /// The service answered with a non-success status.
    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The response is missing fields the contract requires.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    UnexpectedLabel(#[from] UnexpectedLabel),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MlError {
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// The remote answered, but not in a shape we can interpret.
    ///
    /// These abort a whole request instead of being absorbed per frame.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, MlError::MalformedResponse(_) | MlError::UnexpectedLabel(_))
    }
}
