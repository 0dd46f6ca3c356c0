//! Split → analyze → merge orchestration for one uploaded recording.

use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use tracing::Instrument;

use quadcam_gemini::{Analyzer, GeminiError, Merger};
use quadcam_media::{MediaError, VideoSplitter};
use quadcam_models::ProcessingReport;

use crate::logging::PipelineLogger;
use crate::metrics;

/// Success message returned with every report.
pub const SUCCESS_MESSAGE: &str = "File uploaded, split and analyzed successfully";

/// Failure of a whole run. View-level analysis failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Splitting failed: {0}")]
    Split(#[from] MediaError),

    #[error("Merging failed: {0}")]
    Merge(#[from] GeminiError),
}

/// Runs the three pipeline stages in order.
pub struct ProcessingPipeline {
    splitter: VideoSplitter,
    analyzer: Analyzer,
    merger: Merger,
}

impl ProcessingPipeline {
    pub fn new(splitter: VideoSplitter, analyzer: Analyzer, merger: Merger) -> Self {
        Self {
            splitter,
            analyzer,
            merger,
        }
    }

    /// Process `video_path`, reporting it under `filename`.
    pub async fn process(
        &self,
        video_path: &Path,
        filename: &str,
        logger: &PipelineLogger,
    ) -> Result<ProcessingReport, PipelineError> {
        let span = logger.create_span();
        let result = self.run(video_path, filename, logger).instrument(span).await;

        match &result {
            Ok(_) => metrics::record_pipeline_run("success"),
            Err(PipelineError::Split(_)) => metrics::record_pipeline_run("split_failed"),
            Err(PipelineError::Merge(_)) => metrics::record_pipeline_run("merge_failed"),
        }
        result
    }

    async fn run(
        &self,
        video_path: &Path,
        filename: &str,
        logger: &PipelineLogger,
    ) -> Result<ProcessingReport, PipelineError> {
        logger.log_start(&format!("processing {}", filename));

        let started = Instant::now();
        let split = self.splitter.split(video_path).await.map_err(|e| {
            logger.log_error(&format!("split failed: {}", e));
            e
        })?;
        metrics::record_stage_duration("split", started.elapsed().as_secs_f64());
        logger.log_progress(&format!(
            "split {}x{} source into four views ({} frames)",
            split.source.width, split.source.height, split.frames_written
        ));

        let started = Instant::now();
        let analyses = self.analyzer.analyze_all(&split.videos, None).await;
        metrics::record_stage_duration("analyze", started.elapsed().as_secs_f64());
        if analyses.failed_count() > 0 {
            logger.log_warning(&format!(
                "{} of {} views failed analysis",
                analyses.failed_count(),
                analyses.len()
            ));
        } else {
            logger.log_progress("all views analyzed");
        }

        let started = Instant::now();
        let combined = self.merger.merge(&analyses, None).await.map_err(|e| {
            logger.log_error(&format!("merge failed: {}", e));
            e
        })?;
        metrics::record_stage_duration("merge", started.elapsed().as_secs_f64());

        logger.log_completion(filename);

        Ok(ProcessingReport {
            message: SUCCESS_MESSAGE.to_string(),
            filename: filename.to_string(),
            separated_videos: split.videos,
            analysis_results: analyses,
            combined_result: combined,
        })
    }
}
