//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use quadcam_media::MediaError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Processing failed: {message}")]
    Processing { message: String, filename: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Failure anywhere in split → analyze → merge for `filename`.
    pub fn processing(message: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
            filename: filename.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Processing { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::FrameNotFound { .. } => ApiError::NotFound(err.to_string()),
            e if e.is_user_error() => ApiError::BadRequest(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Body to serve instead of the full error in production.
///
/// Attached as a response extension to server-side failures and applied by
/// [`crate::middleware::redact_errors`].
#[derive(Debug, Clone)]
pub struct RedactedError(pub ErrorResponse);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (detail, filename, redacted) = match self {
            ApiError::Internal(message) => (
                format!("Internal error: {}", message),
                None,
                Some(ErrorResponse {
                    detail: "An internal error occurred".to_string(),
                    filename: None,
                }),
            ),
            ApiError::Processing { message, filename } => (
                format!("Processing failed: {}", message),
                Some(filename.clone()),
                Some(ErrorResponse {
                    detail: "Video processing failed".to_string(),
                    filename: Some(filename),
                }),
            ),
            other => (other.to_string(), None, None),
        };

        let mut response = (status, Json(ErrorResponse { detail, filename })).into_response();
        if let Some(body) = redacted {
            response.extensions_mut().insert(RedactedError(body));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_media_error_mapping() {
        let missing: ApiError = MediaError::FileNotFound(PathBuf::from("x.mp4")).into();
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

        let past_end: ApiError = MediaError::FrameNotFound {
            index: 900,
            timestamp: 30.0,
        }
        .into();
        assert_eq!(past_end.status_code(), StatusCode::NOT_FOUND);

        let no_ffmpeg: ApiError = MediaError::FfmpegNotFound.into();
        assert_eq!(no_ffmpeg.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_processing_error_is_500() {
        let err = ApiError::processing("split failed", "demo.mp4");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_server_errors_carry_redacted_body() {
        let response = ApiError::processing("ffprobe exploded", "demo.mp4").into_response();
        let RedactedError(body) = response.extensions().get::<RedactedError>().unwrap();
        assert_eq!(body.detail, "Video processing failed");
        assert_eq!(body.filename.as_deref(), Some("demo.mp4"));

        let response = ApiError::internal("disk full").into_response();
        let RedactedError(body) = response.extensions().get::<RedactedError>().unwrap();
        assert_eq!(body.detail, "An internal error occurred");
        assert!(body.filename.is_none());
    }

    #[test]
    fn test_client_errors_are_not_redacted() {
        let response = ApiError::bad_request("No selected file").into_response();
        assert!(response.extensions().get::<RedactedError>().is_none());
    }
}
