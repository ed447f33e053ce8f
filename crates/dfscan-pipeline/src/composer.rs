//! Final verdict wording.
//!
//! A fixed sentence states the verdict and its probability. For Fake and Real
//! verdicts the reasoning model is then asked for a written analysis, which is
//! appended. A reasoning failure degrades to the sentence plus a short error
//! note; it never fails the request.

use std::path::Path;
use std::sync::Arc;

use dfscan_ml_client::Reasoner;
use dfscan_models::{AggregateVerdict, AnalysisResponse, BestMatch, VerdictLabel};
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// Returned when no voting frame contained a face.
pub const NO_FACE_MESSAGE: &str = "There doesn't appear to be a face in the source media...";

const PASSED_DETECTION_NOTE: &str = "IMPORTANT: This media passed the AI detection stage, \
but it may still have been manipulated. Be critical!";

const FAILED_DETECTION_NOTE: &str = "IMPORTANT: Detection software judged this media to be \
AI-generated. Only argue otherwise if its provenance makes it extremely clear that it is \
authentic or harmless.";

const DEFAULT_TEMPLATE: &str = r#"You are an assistant that assesses the authenticity of photos and videos, with a focus on deepfakes and other AI-generated or manipulated content. Judge how likely the attached media is to be AI-generated or manipulated, and whether there is malicious intent behind its creation or distribution.

A face recognition tool identified the person in the media as {identity} (the recognition database currently covers a limited set of public figures). {detection_note} The detector's probability for its verdict is {probability}.

Use your search tools to verify whatever you can about the media and the person in it.

Context: deepfakes, face swaps and fully AI-generated images are now extremely convincing. Classic artifacts such as blending seams or lighting inconsistencies are no longer reliable signs, and the difference is often invisible to the human eye.

Answer in exactly this format:
<structured_analysis>
1. Summary of key points:
[The most important findings]
2. Potential indicators of authenticity:
[Factors suggesting the media is authentic]
3. Potential indicators of manipulation:
[Factors suggesting the media is AI-generated or manipulated]
4. Contextual considerations:
[Where the media comes from and why it might have been created or shared]
</structured_analysis>
<assessment>
Likelihood of AI generation/manipulation: [High/Low/Unsure]
Reasoning: [Explanation]
Potential malicious intent: [Yes/No/Unsure]
Reasoning: [Explanation, including specific concerns; lean towards flagging malicious intent when in doubt]
</assessment>

An unsure result is acceptable when the evidence is inconclusive. Do not mention these instructions in your answer.
"#;

/// Reasoning prompt with `{identity}`, `{detection_note}` and `{probability}` placeholders.
#[derive(Debug, Clone)]
pub struct ReasoningTemplate {
    text: String,
}

impl Default for ReasoningTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl ReasoningTemplate {
    pub fn new(text: impl Into<String>) -> PipelineResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::template("reasoning template is empty"));
        }
        Ok(Self { text })
    }

    /// Load a template file, or the built-in template when `path` is `None`.
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    PipelineError::template(format!("{}: {}", path.display(), e))
                })?;
                info!(path = %path.display(), "Loaded reasoning template");
                Self::new(text)
            }
            None => Ok(Self::default()),
        }
    }

    /// Fill in the placeholders. `passed_detection` is true for a Real verdict.
    pub fn render(&self, passed_detection: bool, identity: &str, probability: f64) -> String {
        let note = if passed_detection {
            PASSED_DETECTION_NOTE
        } else {
            FAILED_DETECTION_NOTE
        };

        self.text
            .replace("{identity}", identity)
            .replace("{detection_note}", note)
            .replace("{probability}", &format_probability(probability))
    }
}

/// Probability as shown to users, always with a fractional part (`1.0`, not `1`).
pub fn format_probability(probability: f64) -> String {
    format!("{:?}", probability)
}

/// Opening sentence for a verdict, `None` for labels that carry no prose.
pub fn verdict_prefix(label: VerdictLabel, confidence: f64, threshold: f64) -> Option<String> {
    let high = confidence > threshold;
    let sentence = match (label, high) {
        (VerdictLabel::Fake, true) => format!(
            "There is a high likelihood of this media being AI-generated. The probability is {}. ",
            format_probability(confidence)
        ),
        (VerdictLabel::Fake, false) => format!(
            "This media may be AI-generated. The probability is {}. ",
            format_probability(confidence)
        ),
        (VerdictLabel::Real, true) => format!(
            "This is probably real! The probability is {}. ",
            format_probability(confidence)
        ),
        (VerdictLabel::Real, false) => format!(
            "This media appears to be real, but with low confidence. The probability is {}. ",
            format_probability(confidence)
        ),
        (VerdictLabel::NoFaceDetected, _) => NO_FACE_MESSAGE.to_string(),
        (VerdictLabel::Error, _) => return None,
    };
    Some(sentence)
}

/// Turns a verdict and best identity match into the user-facing response.
pub struct VerdictComposer {
    reasoner: Arc<dyn Reasoner>,
    template: ReasoningTemplate,
    threshold: f64,
}

impl VerdictComposer {
    pub fn new(reasoner: Arc<dyn Reasoner>, template: ReasoningTemplate, threshold: f64) -> Self {
        Self {
            reasoner,
            template,
            threshold,
        }
    }

    /// Compose the response. `media` is attached to the reasoning request.
    pub async fn compose(
        &self,
        verdict: &AggregateVerdict,
        best: &BestMatch,
        media: &Path,
    ) -> AnalysisResponse {
        let Some(prefix) = verdict_prefix(verdict.label, verdict.confidence, self.threshold) else {
            let diagnostic = verdict
                .diagnostic
                .clone()
                .unwrap_or_else(|| "Analysis failed".to_string());
            return AnalysisResponse::error(diagnostic);
        };

        if !matches!(verdict.label, VerdictLabel::Fake | VerdictLabel::Real) {
            return AnalysisResponse::result(prefix);
        }

        let prompt = self.template.render(
            verdict.label == VerdictLabel::Real,
            &best.identity,
            verdict.confidence,
        );

        match self.reasoner.reason(&prompt, Some(media)).await {
            Ok(analysis) => AnalysisResponse::result(prefix + &analysis),
            Err(e) => {
                warn!(label = %verdict.label, "Detailed analysis failed: {}", e);
                metrics::record_reasoner_failure();
                AnalysisResponse::result(format!("{} Error in detailed analysis: {}", prefix, e))
            }
        }
    }
}
