//! Upload handlers: multipart file upload and download-by-URL.
//!
//! Both store the source recording under the upload directory and then run
//! the split → analyze → merge pipeline before responding.

use std::path::{Path, PathBuf};
use std::time::Instant;

use axum::extract::multipart::Field;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use quadcam_media::{download_to_file, ensure_dir, remove_file_quietly, sanitize_filename};
use quadcam_models::{ProcessingReport, RunId};

use crate::error::{ApiError, ApiResult};
use crate::logging::PipelineLogger;
use crate::metrics;
use crate::middleware::RequestId;
use crate::security::validate_video_url;
use crate::state::AppState;

/// Multipart field carrying the recording.
pub const VIDEO_FIELD: &str = "video";

/// Upload a recording as multipart form data and process it.
pub async fn upload(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProcessingReport>> {
    let logger = PipelineLogger::new(&run_id(request_id), "upload");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request("No selected file"));
        }

        let path = store_field(field, &state.config.upload_dir, &filename).await?;
        return run_pipeline(&state, &path, &filename, &logger).await;
    }

    Err(ApiError::bad_request("No video file provided"))
}

/// Write a multipart field to `<dir>/<uuid>_<sanitized filename>`, chunk by chunk.
///
/// The prefix keeps concurrent uploads of the same name from sharing a file.
async fn store_field(mut field: Field<'_>, dir: &Path, filename: &str) -> ApiResult<PathBuf> {
    let stored_name = sanitize_filename(filename)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid filename: {}", filename)))?;

    ensure_dir(dir).await?;
    let path = dir.join(stored_file_name(&stored_name));

    let mut file = File::create(&path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create {}: {}", path.display(), e)))?;

    let mut written: u64 = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                drop(file);
                remove_file_quietly(&path).await;
                return Err(ApiError::bad_request(format!("Upload interrupted: {}", e)));
            }
        };

        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            remove_file_quietly(&path).await;
            return Err(ApiError::internal(format!("Failed to write upload: {}", e)));
        }
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;

    info!(path = %path.display(), bytes = written, "Stored upload");
    Ok(path)
}

fn stored_file_name(sanitized: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitized)
}

/// Request body for [`upload_url`].
#[derive(Debug, Deserialize, Validate)]
pub struct UploadUrlRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No URL provided"))]
    pub url: String,
}

/// Download a recording from a URL and process it.
pub async fn upload_url(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<UploadUrlRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessingReport>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let url = validate_video_url(&request.url, state.config.allow_private_urls)
        .into_result()
        .map_err(ApiError::bad_request)?;

    let logger = PipelineLogger::new(&run_id(request_id), "upload_url");

    ensure_dir(&state.config.upload_dir).await?;
    let filename = format!("{}.mp4", Uuid::new_v4());
    let path = state.config.upload_dir.join(&filename);

    let started = Instant::now();
    download_to_file(&state.http, &url, &path)
        .await
        .map_err(|e| {
            warn!(url = %url, "Download failed: {}", e);
            ApiError::from(e)
        })?;
    metrics::record_download_duration(started.elapsed().as_secs_f64());

    run_pipeline(&state, &path, &filename, &logger).await
}

async fn run_pipeline(
    state: &AppState,
    path: &Path,
    filename: &str,
    logger: &PipelineLogger,
) -> ApiResult<Json<ProcessingReport>> {
    state
        .pipeline
        .process(path, filename, logger)
        .await
        .map(Json)
        .map_err(|e| ApiError::processing(e.to_string(), filename))
}

/// Runs are keyed by the request ID so logs join up with access logs.
fn run_id(request_id: Option<Extension<RequestId>>) -> RunId {
    match request_id {
        Some(Extension(RequestId(id))) => RunId::from_string(id),
        None => RunId::new(),
    }
}
