//! Frame extraction handler.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use quadcam_media::extract_frame;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::resolve_managed_path;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    /// Path of an uploaded or separated video, as returned by an upload
    pub video_path: String,
    /// Seconds from the start of the video; omitted means the first frame
    #[serde(default)]
    pub timestamp: f64,
}

/// Return the frame shown at `timestamp` as a JPEG attachment.
pub async fn get_frame(
    State(state): State<AppState>,
    payload: Result<Json<FrameRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    // Only files the service wrote itself may be read back
    let roots = [
        state.config.upload_dir.as_path(),
        state.config.separated_dir.as_path(),
    ];
    let path = resolve_managed_path(&request.video_path, &roots)
        .await
        .ok_or_else(|| ApiError::bad_request(format!("Video not found: {}", request.video_path)))?;

    let jpeg = extract_frame(&path, request.timestamp).await?;
    metrics::record_frame_extracted();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"frame_{}.jpg\"", request.timestamp),
        )
        .body(Body::from(jpeg))
        .map_err(|e| ApiError::internal(e.to_string()))
}
