//! Shared data models for the Quadcam backend.
//!
//! This crate provides Serde-serializable types for:
//! - Camera views and their quadrant layout
//! - Per-view analysis outcomes and the merged timeline
//! - Processing run identifiers and result payloads

pub mod analysis;
pub mod video;
pub mod view;

// Re-export common types
pub use analysis::{CombinedResult, ViewAnalyses, ViewOutcome};
pub use video::{ProcessingReport, RunId, SeparatedVideos};
pub use view::{CameraView, ViewParseError};
