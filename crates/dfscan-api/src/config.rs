//! API configuration.

use std::path::PathBuf;

use dfscan_ml_client::config::{parse_or, process_env, EnvSource};
use dfscan_ml_client::{ConfigError, ConfigResult};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Uploads are written here and removed after analysis
    pub upload_dir: PathBuf,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            upload_dir: PathBuf::from("uploads"),
            max_body_size: 200 * 1024 * 1024, // 200MB
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(env: &impl EnvSource) -> ConfigResult<Self> {
        let defaults = Self::default();

        let max_body_size = parse_or(env, "MAX_BODY_SIZE", defaults.max_body_size)?;
        if max_body_size == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_BODY_SIZE",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            host: env.get("API_HOST").unwrap_or(defaults.host),
            port: parse_or(env, "API_PORT", defaults.port)?,
            cors_origins: env
                .get("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            upload_dir: env
                .get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_body_size,
            environment: env.get("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: env
                .get("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_source(&source(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_source(&source(&[
            ("API_PORT", "8080"),
            ("CORS_ORIGINS", "https://a.example.com, https://b.example.com"),
            ("ENVIRONMENT", "Production"),
            ("METRICS_ENABLED", "false"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.is_production());
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_invalid_port() {
        assert!(ApiConfig::from_source(&source(&[("API_PORT", "99999")])).is_err());
        assert!(ApiConfig::from_source(&source(&[("MAX_BODY_SIZE", "0")])).is_err());
    }
}
