//! Face recognition results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity reported when no match was found.
pub const UNIDENTIFIED: &str = "unidentified";

/// Status code carried by the unidentified sentinel.
pub const UNIDENTIFIED_STATUS: u16 = 404;

/// Recognition outcome for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecognitionResult {
    /// HTTP status reported by the recognition service
    pub status_code: u16,
    /// Similarity of the match in `[0, 1]`, `0` when unidentified
    pub similarity: f64,
    /// Matched identity or [`UNIDENTIFIED`]
    pub identity: String,
}

/// Highest-similarity identity across all analyzed units.
pub type BestMatch = RecognitionResult;

impl RecognitionResult {
    pub fn new(status_code: u16, similarity: f64, identity: impl Into<String>) -> Self {
        Self {
            status_code,
            similarity,
            identity: identity.into(),
        }
    }

    /// The canonical "no match found" value: `(404, 0, "unidentified")`.
    pub fn unidentified() -> Self {
        Self::new(UNIDENTIFIED_STATUS, 0.0, UNIDENTIFIED)
    }

    /// Whether the service reported success for this result.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_identified(&self) -> bool {
        self.is_success() && self.identity != UNIDENTIFIED
    }
}

impl Default for RecognitionResult {
    fn default() -> Self {
        Self::unidentified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        let sentinel = RecognitionResult::unidentified();
        assert_eq!(sentinel.status_code, 404);
        assert_eq!(sentinel.similarity, 0.0);
        assert_eq!(sentinel.identity, "unidentified");
        assert!(!sentinel.is_success());
        assert!(!sentinel.is_identified());
        assert_eq!(RecognitionResult::default(), sentinel);
    }

    #[test]
    fn test_success_range() {
        assert!(RecognitionResult::new(200, 0.4, "A").is_success());
        assert!(RecognitionResult::new(204, 0.4, "A").is_success());
        assert!(!RecognitionResult::new(500, 0.4, "A").is_success());
    }
}
