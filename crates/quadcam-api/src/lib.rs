//! Axum HTTP API server.
//!
//! This crate provides:
//! - Upload and download-by-URL endpoints running the split → analyze → merge pipeline
//! - Frame extraction by timestamp
//! - Rate limiting, request IDs and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{PipelineError, ProcessingPipeline};
pub use state::{AppState, StateError};
