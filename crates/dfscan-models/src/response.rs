//! Response envelope exposed to the upload handler.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Either `{"result": "..."}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisResponse {
    Result(String),
    Error(String),
}

impl AnalysisResponse {
    pub fn result(text: impl Into<String>) -> Self {
        Self::Result(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(text.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResponse::Error(_))
    }

    /// The result or error text.
    pub fn text(&self) -> &str {
        match self {
            AnalysisResponse::Result(text) | AnalysisResponse::Error(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let ok = serde_json::to_string(&AnalysisResponse::result("fine")).unwrap();
        assert_eq!(ok, r#"{"result":"fine"}"#);

        let err = serde_json::to_string(&AnalysisResponse::error("boom")).unwrap();
        assert_eq!(err, r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_round_trip_from_wire() {
        let parsed: AnalysisResponse = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert!(parsed.is_error());
        assert_eq!(parsed.text(), "nope");
    }
}
