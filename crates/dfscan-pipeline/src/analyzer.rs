//! Request orchestration.
//!
//! An image is classified once and, if it shows a face, matched against
//! known identities. A video is reduced to a handful of frames; each frame is
//! classified and recognized concurrently, bounded by a semaphore, and the
//! results are folded into one verdict and one best match. Everything runs
//! inside the caller's future: dropping it cancels in-flight requests and
//! deletes the frames.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use dfscan_media::{media_kind, FrameSampler, MediaKind, MediaUnit};
use dfscan_ml_client::{
    ClassifierClient, FaceRecognizer, GeminiReasoner, ImageClassifier, MlResult, Reasoner,
    RecognizerClient,
};
use dfscan_models::{
    AggregateVerdict, AnalysisResponse, ClassificationResult, RecognitionResult,
};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::aggregator::{aggregate, FrameOutcome};
use crate::best_match::select_best_match;
use crate::composer::{ReasoningTemplate, VerdictComposer};
use crate::config::{AnalyzerConfig, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::logging::AnalysisLogger;
use crate::metrics;

/// Results of both collaborators for one frame.
struct FrameReport {
    index: Option<u64>,
    classified: MlResult<ClassificationResult>,
    recognized: MlResult<RecognitionResult>,
}

/// Analyzes uploaded media and produces the user-facing verdict.
pub struct MediaAnalyzer {
    config: PipelineConfig,
    sampler: FrameSampler,
    classifier: Arc<dyn ImageClassifier>,
    recognizer: Arc<dyn FaceRecognizer>,
    composer: VerdictComposer,
}

impl MediaAnalyzer {
    pub fn new(
        config: PipelineConfig,
        classifier: Arc<dyn ImageClassifier>,
        recognizer: Arc<dyn FaceRecognizer>,
        reasoner: Arc<dyn Reasoner>,
    ) -> PipelineResult<Self> {
        let template = ReasoningTemplate::load(config.reasoning_template_path.as_deref())?;
        let composer = VerdictComposer::new(reasoner, template, config.high_confidence_threshold);

        Ok(Self {
            sampler: FrameSampler::new(config.max_frames, config.ffmpeg_timeout),
            config,
            classifier,
            recognizer,
            composer,
        })
    }

    /// Build the analyzer with the HTTP clients for every collaborator.
    pub fn from_config(config: AnalyzerConfig) -> PipelineResult<Self> {
        let classifier = Arc::new(ClassifierClient::new(config.classifier)?);
        let recognizer = Arc::new(RecognizerClient::new(config.recognizer)?);
        let reasoner = Arc::new(GeminiReasoner::new(config.reasoner)?);

        Self::new(config.pipeline, classifier, recognizer, reasoner)
    }

    /// Create from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_config(AnalyzerConfig::from_env()?)
    }

    /// Analyze the media at `media_path`.
    ///
    /// Never fails: problems are reported as [`AnalysisResponse::Error`].
    pub async fn analyze(&self, media_path: &Path) -> AnalysisResponse {
        self.analyze_with_id(media_path, &Uuid::new_v4().to_string()).await
    }

    /// Like [`MediaAnalyzer::analyze`], logging under the caller's request id.
    pub async fn analyze_with_id(&self, media_path: &Path, request_id: &str) -> AnalysisResponse {
        let kind = media_kind(media_path);
        let logger = AnalysisLogger::with_request_id(request_id, kind);
        let started = Instant::now();

        let outcome = async {
            logger.log_start(&media_path.display().to_string());
            match kind {
                MediaKind::Image => self.analyze_image(media_path, &logger).await,
                MediaKind::Video => self.analyze_video(media_path, &logger).await,
                MediaKind::Unsupported => {
                    Err(PipelineError::UnsupportedMedia(media_path.to_path_buf()))
                }
            }
        }
        .instrument(logger.create_span())
        .await;

        let response = outcome.unwrap_or_else(|e| {
            logger.log_warning(&e.to_string());
            AnalysisResponse::error(e.to_string())
        });

        let elapsed = started.elapsed().as_secs_f64();
        let label = if response.is_error() { "error" } else { "result" };
        metrics::record_analysis(kind, label, elapsed);
        logger.log_completion(&format!("{} in {:.2}s", label, elapsed));

        response
    }

    async fn analyze_image(
        &self,
        path: &Path,
        logger: &AnalysisLogger,
    ) -> PipelineResult<AnalysisResponse> {
        let unit = MediaUnit::original(path);
        let result = self.classifier.classify(unit.path()).await?;
        logger.log_progress(&format!(
            "classified as '{}' ({})",
            result.label.as_str(),
            result.confidence
        ));

        let verdict = AggregateVerdict::from_single(&result);
        metrics::record_verdict(verdict.label);

        let best = if result.label.has_face() {
            let recognized = self.recognizer.recognize(unit.path()).await;
            if let Err(e) = &recognized {
                metrics::record_frame_failure("recognize");
                logger.log_warning(&format!("recognition failed: {}", e));
            }
            select_best_match(std::iter::once(&recognized))
        } else {
            RecognitionResult::unidentified()
        };

        Ok(self.composer.compose(&verdict, &best, path).await)
    }

    async fn analyze_video(
        &self,
        path: &Path,
        logger: &AnalysisLogger,
    ) -> PipelineResult<AnalysisResponse> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let work_dir = tempfile::Builder::new()
            .prefix("dfscan-")
            .tempdir_in(&self.config.work_dir)?;

        let units = self.sampler.sample(path, work_dir.path()).await;
        metrics::record_frames_sampled(units.len());
        logger.log_progress(&format!("sampled {} frames", units.len()));

        let response = self.analyze_frames(path, units, logger).await;

        if let Err(e) = work_dir.close() {
            warn!("Failed to remove frame directory: {}", e);
        }
        response
    }

    /// Classify and recognize `units` concurrently and fold the results.
    pub(crate) async fn analyze_frames(
        &self,
        media: &Path,
        units: Vec<MediaUnit>,
        logger: &AnalysisLogger,
    ) -> PipelineResult<AnalysisResponse> {
        let semaphore = Semaphore::new(self.config.max_frame_parallel);
        let reports = join_all(
            units
                .into_iter()
                .map(|unit| self.analyze_frame(unit, &semaphore)),
        )
        .await;

        let mut outcomes = Vec::with_capacity(reports.len());
        let mut recognitions = Vec::with_capacity(reports.len());

        for report in reports {
            let index = report.index.unwrap_or_default();
            match report.classified {
                Ok(result) => {
                    debug!(frame_index = index, label = result.label.as_str(), "Frame classified");
                    outcomes.push(FrameOutcome::Classified(result));
                }
                Err(e) if e.is_contract_violation() => return Err(e.into()),
                Err(e) => {
                    metrics::record_frame_failure("classify");
                    logger.log_warning(&format!("frame {} classification failed: {}", index, e));
                    outcomes.push(FrameOutcome::Failed(e.to_string()));
                }
            }

            if let Err(e) = &report.recognized {
                metrics::record_frame_failure("recognize");
                logger.log_warning(&format!("frame {} recognition failed: {}", index, e));
            }
            recognitions.push(report.recognized);
        }

        let verdict = aggregate(&outcomes);
        metrics::record_verdict(verdict.label);
        logger.log_progress(&format!(
            "verdict '{}' ({}) from {} of {} frames",
            verdict.label, verdict.confidence, verdict.summary.frames_with_faces,
            verdict.summary.total_frames
        ));

        let best = select_best_match(&recognitions);
        Ok(self.composer.compose(&verdict, &best, media).await)
    }

    async fn analyze_frame(&self, unit: MediaUnit, semaphore: &Semaphore) -> FrameReport {
        // The semaphore is never closed
        let _permit = semaphore.acquire().await.ok();

        let (classified, recognized) = tokio::join!(
            self.classifier.classify(unit.path()),
            self.recognizer.recognize(unit.path())
        );

        let index = unit.frame_index();
        unit.release();

        FrameReport {
            index,
            classified,
            recognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dfscan_ml_client::MlError;
    use dfscan_models::{ClassificationLabel, UnexpectedLabel};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    type ClassifyFn = dyn Fn(&Path) -> MlResult<ClassificationResult> + Send + Sync;
    type RecognizeFn = dyn Fn(&Path) -> MlResult<RecognitionResult> + Send + Sync;

    struct FnClassifier {
        answer: Box<ClassifyFn>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FnClassifier {
        fn new(answer: impl Fn(&Path) -> MlResult<ClassificationResult> + Send + Sync + 'static) -> Self {
            Self {
                answer: Box::new(answer),
                delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ImageClassifier for FnClassifier {
        async fn classify(&self, image: &Path) -> MlResult<ClassificationResult> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            (self.answer)(image)
        }
    }

    struct FnRecognizer {
        answer: Box<RecognizeFn>,
        calls: AtomicUsize,
    }

    impl FnRecognizer {
        fn new(answer: impl Fn(&Path) -> MlResult<RecognitionResult> + Send + Sync + 'static) -> Self {
            Self {
                answer: Box::new(answer),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FaceRecognizer for FnRecognizer {
        async fn recognize(&self, image: &Path) -> MlResult<RecognitionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.answer)(image)
        }
    }

    #[derive(Default)]
    struct EchoReasoner {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Reasoner for EchoReasoner {
        async fn reason(&self, prompt: &str, _attachment: Option<&Path>) -> MlResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("[analysis]".to_string())
        }
    }

    struct Harness {
        analyzer: MediaAnalyzer,
        classifier: Arc<FnClassifier>,
        recognizer: Arc<FnRecognizer>,
        reasoner: Arc<EchoReasoner>,
        dir: TempDir,
    }

    fn harness(classifier: FnClassifier, recognizer: FnRecognizer, parallel: usize) -> Harness {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            max_frame_parallel: parallel,
            work_dir: dir.path().join("work"),
            ..PipelineConfig::default()
        };
        let classifier = Arc::new(classifier);
        let recognizer = Arc::new(recognizer);
        let reasoner = Arc::new(EchoReasoner::default());
        let analyzer = MediaAnalyzer::new(
            config,
            classifier.clone(),
            recognizer.clone(),
            reasoner.clone(),
        )
        .unwrap();

        Harness {
            analyzer,
            classifier,
            recognizer,
            reasoner,
            dir,
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    fn label_by_name(path: &Path) -> MlResult<ClassificationResult> {
        let name = file_name(path);
        let label = if name.starts_with("fake") {
            ClassificationLabel::Fake
        } else if name.starts_with("real") {
            ClassificationLabel::Real
        } else {
            ClassificationLabel::NoFaceDetected
        };
        Ok(ClassificationResult::single(label, 0.9))
    }

    fn nobody(_: &Path) -> MlResult<RecognitionResult> {
        Ok(RecognitionResult::unidentified())
    }

    fn frames(dir: &Path, names: &[&str]) -> (Vec<MediaUnit>, Vec<PathBuf>) {
        let paths: Vec<PathBuf> = names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, b"jpeg").unwrap();
                path
            })
            .collect();
        let units = paths
            .iter()
            .enumerate()
            .map(|(i, p)| MediaUnit::extracted_frame(p, i as u64 * 10))
            .collect();
        (units, paths)
    }

    fn image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"png").unwrap();
        path
    }

    #[tokio::test]
    async fn test_unsupported_file_type() {
        let h = harness(FnClassifier::new(label_by_name), FnRecognizer::new(nobody), 4);
        let response = h.analyzer.analyze(Path::new("notes.txt")).await;

        assert!(response.is_error());
        assert!(response.text().starts_with("Unsupported file type"));
        assert_eq!(h.classifier.peak.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_fake_with_identity() {
        let h = harness(
            FnClassifier::new(label_by_name),
            FnRecognizer::new(|_| Ok(RecognitionResult::new(200, 0.77, "Jane Doe"))),
            4,
        );
        let path = image(h.dir.path(), "fake_face.png");

        let response = h.analyzer.analyze(&path).await;
        assert_eq!(
            response,
            AnalysisResponse::result(
                "There is a high likelihood of this media being AI-generated. \
                 The probability is 0.9. [analysis]"
            )
        );
        assert!(h.reasoner.prompts.lock().unwrap()[0].contains("Jane Doe"));
        assert!(path.exists(), "originals are never deleted");
    }

    #[tokio::test]
    async fn test_image_without_face_skips_recognition() {
        let h = harness(FnClassifier::new(label_by_name), FnRecognizer::new(nobody), 4);
        let path = image(h.dir.path(), "landscape.jpg");

        let response = h.analyzer.analyze(&path).await;
        assert_eq!(
            response,
            AnalysisResponse::result("There doesn't appear to be a face in the source media...")
        );
        assert_eq!(h.recognizer.calls.load(Ordering::SeqCst), 0);
        assert!(h.reasoner.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_recognition_failure_uses_sentinel() {
        let h = harness(
            FnClassifier::new(label_by_name),
            FnRecognizer::new(|_| Err(MlError::remote("recognizer down"))),
            4,
        );
        let path = image(h.dir.path(), "real_face.jpg");

        let response = h.analyzer.analyze(&path).await;
        assert!(!response.is_error());
        assert!(h.reasoner.prompts.lock().unwrap()[0].contains("as unidentified"));
    }

    #[tokio::test]
    async fn test_image_unexpected_label_is_error() {
        let h = harness(
            FnClassifier::new(|_| Err(UnexpectedLabel("Maybe".into()).into())),
            FnRecognizer::new(nobody),
            4,
        );
        let path = image(h.dir.path(), "face.png");

        let response = h.analyzer.analyze(&path).await;
        assert_eq!(response, AnalysisResponse::error("Unexpected label: Maybe"));
    }

    #[tokio::test]
    async fn test_unopenable_video_is_no_face() {
        let h = harness(FnClassifier::new(label_by_name), FnRecognizer::new(nobody), 4);
        let missing = h.dir.path().join("missing.mp4");

        let response = h.analyzer.analyze(&missing).await;
        assert_eq!(
            response,
            AnalysisResponse::result("There doesn't appear to be a face in the source media...")
        );
        let leftover = std::fs::read_dir(h.dir.path().join("work")).unwrap().count();
        assert_eq!(leftover, 0, "per-request frame directory is removed");
    }

    #[tokio::test]
    async fn test_frames_majority_and_best_match() {
        let h = harness(
            FnClassifier::new(label_by_name),
            FnRecognizer::new(|path| {
                Ok(match file_name(path).as_str() {
                    "fake_1.jpg" => RecognitionResult::new(200, 0.5, "A"),
                    "fake_2.jpg" => RecognitionResult::new(200, 0.9, "B"),
                    _ => RecognitionResult::unidentified(),
                })
            }),
            4,
        );
        let (units, paths) = frames(h.dir.path(), &["fake_1.jpg", "fake_2.jpg", "real_1.jpg"]);
        let logger = AnalysisLogger::new(MediaKind::Video);

        let response = h
            .analyzer
            .analyze_frames(Path::new("clip.mp4"), units, &logger)
            .await
            .unwrap();

        assert!(response.text().starts_with("There is a high likelihood"));
        assert!(h.reasoner.prompts.lock().unwrap()[0].contains("as B ("));
        assert_eq!(h.recognizer.calls.load(Ordering::SeqCst), 3);
        assert!(paths.iter().all(|p| !p.exists()), "frames are released");
    }

    #[tokio::test]
    async fn test_frames_tie_goes_to_real() {
        let h = harness(FnClassifier::new(label_by_name), FnRecognizer::new(nobody), 4);
        let (units, _) = frames(
            h.dir.path(),
            &["fake_1.jpg", "real_1.jpg", "fake_2.jpg", "real_2.jpg"],
        );
        let logger = AnalysisLogger::new(MediaKind::Video);

        let response = h
            .analyzer
            .analyze_frames(Path::new("clip.mp4"), units, &logger)
            .await
            .unwrap();
        assert!(response.text().starts_with("This is probably real!"));
    }

    #[tokio::test]
    async fn test_all_frames_failing_is_error() {
        let h = harness(
            FnClassifier::new(|_| Err(MlError::remote("Classifier returned 503"))),
            FnRecognizer::new(nobody),
            4,
        );
        let (units, paths) = frames(h.dir.path(), &["a.jpg", "b.jpg"]);
        let logger = AnalysisLogger::new(MediaKind::Video);

        let response = h
            .analyzer
            .analyze_frames(Path::new("clip.mp4"), units, &logger)
            .await
            .unwrap();
        assert!(response.is_error());
        assert!(response.text().contains("Classifier returned 503"));
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_malformed_frame_aborts_request() {
        let h = harness(
            FnClassifier::new(|path| {
                if file_name(path) == "bad.jpg" {
                    Err(MlError::malformed("missing `label`"))
                } else {
                    label_by_name(path)
                }
            }),
            FnRecognizer::new(nobody),
            4,
        );
        let (units, paths) = frames(h.dir.path(), &["fake_1.jpg", "bad.jpg"]);
        let logger = AnalysisLogger::new(MediaKind::Video);

        let err = h
            .analyzer
            .analyze_frames(Path::new("clip.mp4"), units, &logger)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Malformed response: missing `label`");
        assert!(h.reasoner.prompts.lock().unwrap().is_empty());
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_frame_parallelism_is_bounded() {
        let h = harness(
            FnClassifier::new(label_by_name).with_delay(Duration::from_millis(20)),
            FnRecognizer::new(nobody),
            2,
        );
        let names: Vec<String> = (0..6).map(|i| format!("real_{}.jpg", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let (units, _) = frames(h.dir.path(), &names);
        let logger = AnalysisLogger::new(MediaKind::Video);

        h.analyzer
            .analyze_frames(Path::new("clip.mp4"), units, &logger)
            .await
            .unwrap();

        let peak = h.classifier.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 2, "peak concurrency was {}", peak);
    }

    #[tokio::test]
    async fn test_cancellation_deletes_frames() {
        let h = harness(
            FnClassifier::new(label_by_name).with_delay(Duration::from_secs(30)),
            FnRecognizer::new(nobody),
            4,
        );
        let (units, paths) = frames(h.dir.path(), &["real_1.jpg", "real_2.jpg"]);
        let logger = AnalysisLogger::new(MediaKind::Video);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            h.analyzer.analyze_frames(Path::new("clip.mp4"), units, &logger),
        )
        .await;

        assert!(cancelled.is_err());
        assert!(paths.iter().all(|p| !p.exists()));
        assert!(h.reasoner.prompts.lock().unwrap().is_empty());
    }
}
