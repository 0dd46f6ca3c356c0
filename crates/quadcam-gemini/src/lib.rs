//! Gemini client for four-camera video analysis.
//!
//! Provides the `generateContent` REST client behind the [`GenerativeModel`]
//! trait, the analysis/merge/summary prompts, the per-view [`Analyzer`] with
//! transient-error retry, and the timeline [`Merger`].

pub mod analyzer;
pub mod client;
pub mod config;
pub mod error;
pub mod merger;
pub mod prompts;
pub mod retry;
pub mod types;

#[cfg(test)]
mod testing;

pub use analyzer::{AnalyzeOptions, Analyzer};
pub use client::{GeminiClient, GenerativeModel};
pub use config::{resolve_credential, GeminiConfig};
pub use error::{GeminiError, GeminiResult};
pub use merger::Merger;
pub use retry::{retry_transient, RetryPolicy};
pub use types::ModelRequest;
