//! Classifier and verdict labels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label returned by the remote classifier for one image.
///
/// The remote contract fixes the wire strings to exactly `"Fake"`, `"Real"`
/// and `"No face detected!"`. Anything else fails to parse with
/// [`UnexpectedLabel`] instead of being coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ClassificationLabel {
    #[serde(rename = "Fake")]
    Fake,
    #[serde(rename = "Real")]
    Real,
    #[serde(rename = "No face detected!")]
    NoFaceDetected,
}

impl ClassificationLabel {
    /// Wire string used by the classifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::Fake => "Fake",
            ClassificationLabel::Real => "Real",
            ClassificationLabel::NoFaceDetected => "No face detected!",
        }
    }

    /// Whether this label takes part in frame voting.
    pub fn has_face(&self) -> bool {
        !matches!(self, ClassificationLabel::NoFaceDetected)
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClassificationLabel {
    type Err = UnexpectedLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Fake" => Ok(ClassificationLabel::Fake),
            "Real" => Ok(ClassificationLabel::Real),
            "No face detected!" => Ok(ClassificationLabel::NoFaceDetected),
            other => Err(UnexpectedLabel(other.to_string())),
        }
    }
}

/// A classifier label outside the fixed set, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected label: {0}")]
pub struct UnexpectedLabel(pub String);

/// Label of a final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum VerdictLabel {
    Fake,
    Real,
    NoFaceDetected,
    /// Every sampled frame failed classification.
    Error,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Fake => "Fake",
            VerdictLabel::Real => "Real",
            VerdictLabel::NoFaceDetected => "NoFaceDetected",
            VerdictLabel::Error => "Error",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ClassificationLabel> for VerdictLabel {
    fn from(label: ClassificationLabel) -> Self {
        match label {
            ClassificationLabel::Fake => VerdictLabel::Fake,
            ClassificationLabel::Real => VerdictLabel::Real,
            ClassificationLabel::NoFaceDetected => VerdictLabel::NoFaceDetected,
        }
    }
}
