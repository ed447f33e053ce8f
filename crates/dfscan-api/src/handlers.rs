//! HTTP handlers.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use chrono::Utc;
use dfscan_models::AnalysisResponse;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;
use crate::state::AppState;
use crate::upload::save_upload;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Analyze an uploaded photo or video.
///
/// Expects a multipart body with the media in the `file` field.
pub async fn analyze(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No file part"))?;
    let upload = save_upload(&state.config.upload_dir, &mut multipart).await?;

    let request_id = request_id
        .map(|Extension(RequestId(id))| id)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(
        request_id = %request_id,
        name = %upload.original_name(),
        "Analyzing upload"
    );

    let response = state
        .analyzer
        .analyze_with_id(upload.path(), &request_id)
        .await;
    upload.remove();

    match response {
        AnalysisResponse::Error(message) => Err(ApiError::Analysis(message)),
        result => Ok(Json(result)),
    }
}
