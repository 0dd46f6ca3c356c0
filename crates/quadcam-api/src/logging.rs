//! Structured pipeline logging.
//!
//! Lifecycle events for one processing run carry the run ID and the
//! operation name so a run can be followed across split, analysis and merge.

use tracing::{error, info, warn, Span};

use quadcam_models::RunId;

/// Logger for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    run_id: String,
    operation: String,
}

impl PipelineLogger {
    /// Create a logger for a run and operation (e.g. `upload`, `upload_url`).
    pub fn new(run_id: &RunId, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "pipeline",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }
}
