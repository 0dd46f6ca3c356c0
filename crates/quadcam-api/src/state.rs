//! Application state.

use std::sync::Arc;

use thiserror::Error;

use quadcam_gemini::{Analyzer, GeminiClient, GeminiConfig, GeminiError, GenerativeModel, Merger};
use quadcam_media::{SplitConfig, VideoSplitter};

use crate::config::ApiConfig;
use crate::security::download_client;
use crate::services::ProcessingPipeline;

/// Errors raised while assembling [`AppState`].
#[derive(Debug, Error)]
pub enum StateError {
    #[error("model client: {0}")]
    Model(#[from] GeminiError),

    #[error("download client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub gemini: GeminiConfig,
    pub pipeline: Arc<ProcessingPipeline>,
    /// Client for URL downloads; redirects are re-validated hop by hop
    pub http: reqwest::Client,
}

impl AppState {
    /// Build state backed by the Gemini REST API.
    pub fn new(config: ApiConfig, gemini: GeminiConfig) -> Result<Self, StateError> {
        let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::new(&gemini)?);
        Self::with_model(config, gemini, model)
    }

    /// Build state around any model implementation.
    pub fn with_model(
        config: ApiConfig,
        gemini: GeminiConfig,
        model: Arc<dyn GenerativeModel>,
    ) -> Result<Self, StateError> {
        let splitter = VideoSplitter::new(SplitConfig::with_output_dir(&config.separated_dir));
        let analyzer = Analyzer::new(Arc::clone(&model), &gemini);
        let merger = Merger::new(model, &gemini);
        let http = download_client(config.allow_private_urls)?;

        Ok(Self {
            config,
            gemini,
            pipeline: Arc::new(ProcessingPipeline::new(splitter, analyzer, merger)),
            http,
        })
    }
}
