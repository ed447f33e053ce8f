//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use dfscan_media::DEFAULT_MAX_FRAMES;
use dfscan_ml_client::config::{parse_or, parse_secs, process_env, EnvSource};
use dfscan_ml_client::{
    ClassifierConfig, ConfigError, ConfigResult, ReasonerConfig, RecognizerConfig,
};

/// Default threshold above which a verdict counts as high confidence.
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Frames sampled per video
    pub max_frames: usize,
    /// Frames classified and recognized concurrently within one request
    pub max_frame_parallel: usize,
    /// Confidence strictly above this is "high"
    pub high_confidence_threshold: f64,
    /// Parent directory for per-request frame directories
    pub work_dir: PathBuf,
    /// Upper bound on a single FFmpeg frame extraction
    pub ffmpeg_timeout: Duration,
    /// Replaces the built-in reasoning prompt when set
    pub reasoning_template_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            max_frame_parallel: 4,
            high_confidence_threshold: DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
            work_dir: std::env::temp_dir(),
            ffmpeg_timeout: Duration::from_secs(30),
            reasoning_template_path: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(env: &impl EnvSource) -> ConfigResult<Self> {
        let defaults = Self::default();

        let max_frames = parse_or(env, "MAX_FRAMES", defaults.max_frames)?;
        if max_frames == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_FRAMES",
                reason: "must be at least 1".to_string(),
            });
        }

        let max_frame_parallel = parse_or(env, "MAX_FRAME_PARALLEL", defaults.max_frame_parallel)?;
        if max_frame_parallel == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_FRAME_PARALLEL",
                reason: "must be at least 1".to_string(),
            });
        }

        let high_confidence_threshold = parse_or(
            env,
            "HIGH_CONFIDENCE_THRESHOLD",
            defaults.high_confidence_threshold,
        )?;
        if !(0.0..=1.0).contains(&high_confidence_threshold) {
            return Err(ConfigError::Invalid {
                key: "HIGH_CONFIDENCE_THRESHOLD",
                reason: format!("{} is outside [0, 1]", high_confidence_threshold),
            });
        }

        Ok(Self {
            max_frames,
            max_frame_parallel,
            high_confidence_threshold,
            work_dir: env.get("WORK_DIR").map(PathBuf::from).unwrap_or(defaults.work_dir),
            ffmpeg_timeout: parse_secs(env, "FFMPEG_TIMEOUT_SECS", 30)?,
            reasoning_template_path: env.get("REASONING_TEMPLATE_PATH").map(PathBuf::from),
        })
    }
}

/// Everything a [`crate::MediaAnalyzer`] needs, loaded together at startup.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub pipeline: PipelineConfig,
    pub classifier: ClassifierConfig,
    pub recognizer: RecognizerConfig,
    pub reasoner: ReasonerConfig,
}

impl AnalyzerConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(env: &impl EnvSource) -> ConfigResult<Self> {
        Ok(Self {
            pipeline: PipelineConfig::from_source(env)?,
            classifier: ClassifierConfig::from_source(env)?,
            recognizer: RecognizerConfig::from_source(env)?,
            reasoner: ReasonerConfig::from_source(env)?,
        })
    }
}
