//! Gemini client error types.

use std::path::PathBuf;
use thiserror::Error;

pub type GeminiResult<T> = Result<T, GeminiError>;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("No API credential supplied and GEMINI_API_KEY/GOOGLE_API_KEY not configured")]
    MissingCredential,

    #[error("Video file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeminiError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// HTTP status reported by the API, if the call got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GeminiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-side failures that are safe to retry (HTTP 500 and 503).
    pub fn is_transient(&self) -> bool {
        matches!(self.status_code(), Some(500) | Some(503))
    }
}
