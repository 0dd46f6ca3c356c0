//! Business logic services.

pub mod pipeline;

pub use pipeline::{PipelineError, ProcessingPipeline, SUCCESS_MESSAGE};
