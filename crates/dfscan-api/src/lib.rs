//! Axum HTTP API server.
//!
//! - `POST /api/analyze`: multipart upload (`file`), answers `{result}` or `{error}`
//! - `GET /api/health`: liveness probe
//! - `GET /metrics`: Prometheus metrics, when enabled

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
