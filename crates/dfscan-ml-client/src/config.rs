//! Configuration for the remote collaborators.
//!
//! Every value is read from the environment once at startup and validated
//! eagerly, so a bad endpoint fails the process instead of the first request.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Source of configuration values: [`process_env`] in production, a map in tests.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment. Blank values count as unset.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

pub fn require(env: &impl EnvSource, key: &'static str) -> ConfigResult<String> {
    env.get(key).ok_or(ConfigError::Missing(key))
}

/// Parse `key` if set, otherwise use `default`.
pub fn parse_or<T>(env: &impl EnvSource, key: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

pub fn parse_url(env: &impl EnvSource, key: &'static str) -> ConfigResult<Url> {
    let raw = require(env, key)?;
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Seconds from `key`, which must be positive.
pub fn parse_secs(env: &impl EnvSource, key: &'static str, default: u64) -> ConfigResult<Duration> {
    let secs = parse_or(env, key, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Default classifier model selector.
pub const DEFAULT_CLASSIFIER_MODEL: &str = "Self-Blended Consistency Learning";

/// Default reasoning models, tried in order.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Remote deepfake classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: Url,
    /// Bearer token for the hosted model
    pub token: String,
    /// Model selector forwarded with every request
    pub model: String,
    pub timeout: Duration,
}

impl ClassifierConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(env: &impl EnvSource) -> ConfigResult<Self> {
        Ok(Self {
            endpoint: parse_url(env, "CLASSIFIER_URL")?,
            token: require(env, "CLASSIFIER_TOKEN")?,
            model: env
                .get("CLASSIFIER_MODEL")
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string()),
            timeout: parse_secs(env, "CLASSIFIER_TIMEOUT_SECS", 60)?,
        })
    }
}

/// Remote face recognizer.
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl RecognizerConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(env: &impl EnvSource) -> ConfigResult<Self> {
        Ok(Self {
            endpoint: parse_url(env, "RECOGNIZER_URL")?,
            timeout: parse_secs(env, "RECOGNIZER_TIMEOUT_SECS", 60)?,
        })
    }
}

/// Generative reasoning model (Gemini).
#[derive(Debug, Clone)]
pub struct ReasonerConfig {
    pub api_key: String,
    pub base_url: Url,
    /// Models tried in order until one answers
    pub models: Vec<String>,
    /// Whole-call deadline, covering every fallback model
    pub timeout: Duration,
    /// Media larger than this is not attached to the prompt
    pub max_inline_bytes: u64,
}

impl ReasonerConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(env: &impl EnvSource) -> ConfigResult<Self> {
        let models: Vec<String> = match env.get("GEMINI_MODELS") {
            Some(raw) => raw
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            None => DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        };
        if models.is_empty() {
            return Err(ConfigError::Invalid {
                key: "GEMINI_MODELS",
                reason: "at least one model is required".to_string(),
            });
        }

        let base_url = match env.get("GEMINI_BASE_URL") {
            Some(_) => parse_url(env, "GEMINI_BASE_URL")?,
            None => Url::parse(DEFAULT_GEMINI_BASE_URL).map_err(|e| ConfigError::Invalid {
                key: "GEMINI_BASE_URL",
                reason: e.to_string(),
            })?,
        };

        Ok(Self {
            api_key: require(env, "GEMINI_API_KEY")?,
            base_url,
            models,
            timeout: parse_secs(env, "REASONER_TIMEOUT_SECS", 120)?,
            max_inline_bytes: parse_or(env, "REASONER_MAX_INLINE_BYTES", 20 * 1024 * 1024)?,
        })
    }
}
