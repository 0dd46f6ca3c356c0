//! Per-view video analysis.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use quadcam_models::{CameraView, SeparatedVideos, ViewAnalyses, ViewOutcome};

use crate::client::GenerativeModel;
use crate::config::{resolve_credential, GeminiConfig};
use crate::error::{GeminiError, GeminiResult};
use crate::prompts::analysis_prompt;
use crate::retry::{retry_transient, RetryPolicy};
use crate::types::ModelRequest;

/// Per-call overrides for [`Analyzer::analyze_view`].
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Credential used instead of the configured one
    pub credential: Option<String>,
    /// Prompt used instead of the view instruction and segment format
    pub prompt: Option<String>,
}

impl AnalyzeOptions {
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// Sends view videos to the model and collects action-segment text.
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn GenerativeModel>,
    credential: Option<String>,
    retry: RetryPolicy,
}

impl Analyzer {
    pub fn new(model: Arc<dyn GenerativeModel>, config: &GeminiConfig) -> Self {
        Self {
            model,
            credential: config.api_key.clone(),
            retry: RetryPolicy::new("view analysis", config.max_retries, config.retry_delay),
        }
    }

    /// Analyze one view video and return the model's raw text.
    ///
    /// `label` selects the view instruction (`up`, `front`, `left`, `right`);
    /// other labels fall back to the segment format instruction alone.
    /// Transient API failures are retried per the configured policy.
    pub async fn analyze_view(
        &self,
        video_path: impl AsRef<Path>,
        label: Option<&str>,
        options: &AnalyzeOptions,
    ) -> GeminiResult<String> {
        let video_path = video_path.as_ref();

        let credential =
            resolve_credential(options.credential.as_deref(), self.credential.as_deref())?;

        if !video_path.is_file() {
            return Err(GeminiError::FileNotFound(video_path.to_path_buf()));
        }
        let video = tokio::fs::read(video_path).await?;

        let prompt = match &options.prompt {
            Some(custom) => custom.clone(),
            None => analysis_prompt(label),
        };
        let request = ModelRequest::with_video(video, prompt);

        let started = Instant::now();
        let text = retry_transient(&self.retry, || {
            self.model.generate(&credential, &request)
        })
        .await?;

        metrics::histogram!("quadcam_view_analysis_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(text)
    }

    /// Analyze all four views one after another.
    ///
    /// Never fails as a whole: each view's error is recorded as
    /// [`ViewOutcome::Failed`] in its slot and the remaining views still run.
    /// The result always holds all four views.
    pub async fn analyze_all(
        &self,
        videos: &SeparatedVideos,
        credential: Option<&str>,
    ) -> ViewAnalyses {
        let options = AnalyzeOptions {
            credential: credential.map(str::to_string),
            prompt: None,
        };

        let mut analyses = ViewAnalyses::new();
        for view in CameraView::ALL {
            let outcome = match videos.get(view) {
                Some(path) => {
                    info!(view = %view, path = %path.display(), "Analyzing view");
                    match self.analyze_view(path, Some(view.prompt_label()), &options).await {
                        Ok(text) => ViewOutcome::completed(text),
                        Err(e) => {
                            warn!(view = %view, "View analysis failed: {}", e);
                            ViewOutcome::failed(format!("Analysis failed: {}", e))
                        }
                    }
                }
                None => {
                    warn!(view = %view, "No video for view");
                    ViewOutcome::failed("Analysis failed: no video produced for this view")
                }
            };

            let status = if outcome.is_failed() { "failed" } else { "completed" };
            metrics::counter!(
                "quadcam_view_analyses_total",
                "view" => view.as_str(),
                "outcome" => status
            )
            .increment(1);
            analyses.insert(view, outcome);
        }

        analyses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(max_retries: u32) -> GeminiConfig {
        GeminiConfig::default()
            .with_api_key("configured-key")
            .with_retries(max_retries, Duration::from_millis(1))
    }

    fn write_video(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"fake mp4 bytes").unwrap();
        path
    }

    fn four_videos(dir: &TempDir) -> SeparatedVideos {
        CameraView::ALL
            .iter()
            .map(|v| (*v, write_video(dir, &format!("run{}.mp4", v.file_suffix()))))
            .collect()
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let dir = TempDir::new().unwrap();
        let video = write_video(&dir, "top.mp4");
        let model = Arc::new(ScriptedModel::new(vec![
            Err(GeminiError::api(503, "overloaded")),
            Err(GeminiError::api(500, "internal")),
            Ok("00:00–00:02 : arm moves".to_string()),
        ]));

        let analyzer = Analyzer::new(model.clone(), &config(5));
        let text = analyzer
            .analyze_view(&video, Some("up"), &AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(text, "00:00–00:02 : arm moves");
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_exactly_max_retries() {
        let dir = TempDir::new().unwrap();
        let video = write_video(&dir, "top.mp4");
        let model = Arc::new(ScriptedModel::with_fallback(vec![], |_| {
            Err(GeminiError::api(503, "overloaded"))
        }));

        let analyzer = Analyzer::new(model.clone(), &config(5));
        let err = analyzer
            .analyze_view(&video, Some("up"), &AnalyzeOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(503));
        assert_eq!(model.call_count(), 5);
    }

    #[tokio::test]
    async fn test_non_transient_error_fails_after_one_call() {
        let dir = TempDir::new().unwrap();
        let video = write_video(&dir, "top.mp4");
        let model = Arc::new(ScriptedModel::new(vec![Err(GeminiError::api(
            400,
            "invalid argument",
        ))]));

        let analyzer = Analyzer::new(model.clone(), &config(5));
        let err = analyzer
            .analyze_view(&video, Some("front"), &AnalyzeOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(400));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let dir = TempDir::new().unwrap();
        let video = write_video(&dir, "top.mp4");
        let model = Arc::new(ScriptedModel::new(vec![Ok("unused".to_string())]));

        let analyzer = Analyzer::new(model.clone(), &GeminiConfig::default());
        let err = analyzer
            .analyze_view(&video, Some("up"), &AnalyzeOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiError::MissingCredential));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_video_makes_no_call() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Ok("unused".to_string())]));

        let analyzer = Analyzer::new(model.clone(), &config(5));
        let err = analyzer
            .analyze_view(dir.path().join("gone.mp4"), None, &AnalyzeOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiError::FileNotFound(_)));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_video_prompt_and_explicit_credential() {
        let dir = TempDir::new().unwrap();
        let video = write_video(&dir, "right.mp4");
        let model = Arc::new(ScriptedModel::new(vec![Ok("ok".to_string())]));

        let analyzer = Analyzer::new(model.clone(), &config(5));
        analyzer
            .analyze_view(
                &video,
                Some("right"),
                &AnalyzeOptions::default().with_credential("caller-key"),
            )
            .await
            .unwrap();

        let calls = model.calls();
        let (credential, request) = &calls[0];
        assert_eq!(credential, "caller-key");
        assert_eq!(request.video.as_deref(), Some(&b"fake mp4 bytes"[..]));
        assert!(request
            .prompt
            .starts_with("This video is captured by a camera mounted on the right robotic arm."));
    }

    #[tokio::test]
    async fn test_custom_prompt_replaces_assembled_prompt() {
        let dir = TempDir::new().unwrap();
        let video = write_video(&dir, "top.mp4");
        let model = Arc::new(ScriptedModel::new(vec![Ok("ok".to_string())]));

        let analyzer = Analyzer::new(model.clone(), &config(5));
        analyzer
            .analyze_view(
                &video,
                Some("up"),
                &AnalyzeOptions::default().with_prompt("List grasps only."),
            )
            .await
            .unwrap();

        assert_eq!(model.calls()[0].1.prompt, "List grasps only.");
    }

    #[tokio::test]
    async fn test_batch_isolates_failing_view() {
        let dir = TempDir::new().unwrap();
        let videos = four_videos(&dir);
        let model = Arc::new(ScriptedModel::with_fallback(vec![], |request| {
            if request.prompt.contains("front-facing camera") {
                Err(GeminiError::api(400, "video too long"))
            } else {
                Ok(format!("segments for {}", &request.prompt[..40]))
            }
        }));

        let analyzer = Analyzer::new(model.clone(), &config(3));
        let analyses = analyzer.analyze_all(&videos, None).await;

        assert_eq!(analyses.len(), 4);
        assert_eq!(analyses.failed_count(), 1);
        match analyses.get(CameraView::Front).unwrap() {
            ViewOutcome::Failed { reason } => assert!(reason.contains("video too long")),
            other => panic!("expected failure, got {:?}", other),
        }
        for view in [CameraView::Top, CameraView::Right, CameraView::Left] {
            assert!(analyses.text(view).unwrap().starts_with("segments for"));
        }
        // One call per view; the 400 is not retried.
        assert_eq!(model.call_count(), 4);
    }

    #[tokio::test]
    async fn test_batch_without_credential_fails_every_view() {
        let dir = TempDir::new().unwrap();
        let videos = four_videos(&dir);
        let model = Arc::new(ScriptedModel::new(vec![]));

        let analyzer = Analyzer::new(model.clone(), &GeminiConfig::default());
        let analyses = analyzer.analyze_all(&videos, None).await;

        assert_eq!(analyses.len(), 4);
        assert_eq!(analyses.failed_count(), 4);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_missing_path_recorded_as_failure() {
        let dir = TempDir::new().unwrap();
        let mut videos = SeparatedVideos::new();
        videos.insert(CameraView::Top, write_video(&dir, "top.mp4"));
        let model = Arc::new(ScriptedModel::with_fallback(vec![], |_| Ok("ok".to_string())));

        let analyzer = Analyzer::new(model.clone(), &config(1));
        let analyses = analyzer.analyze_all(&videos, None).await;

        assert_eq!(analyses.len(), 4);
        assert_eq!(analyses.text(CameraView::Top), Some("ok"));
        assert_eq!(analyses.failed_count(), 3);
        assert_eq!(model.call_count(), 1);
    }
}
