//! Timeline merging and summarization.

use std::sync::Arc;

use tracing::{debug, info};

use quadcam_models::{CombinedResult, ViewAnalyses};

use crate::client::GenerativeModel;
use crate::config::{resolve_credential, GeminiConfig};
use crate::error::GeminiResult;
use crate::prompts::{merge_prompt, summary_prompt};
use crate::types::ModelRequest;

/// Combines per-view analyses into one timeline plus a short summary.
///
/// Makes exactly two text-only calls per merge and never retries.
#[derive(Clone)]
pub struct Merger {
    model: Arc<dyn GenerativeModel>,
    credential: Option<String>,
}

impl Merger {
    pub fn new(model: Arc<dyn GenerativeModel>, config: &GeminiConfig) -> Self {
        Self {
            model,
            credential: config.api_key.clone(),
        }
    }

    pub async fn merge(
        &self,
        analyses: &ViewAnalyses,
        credential: Option<&str>,
    ) -> GeminiResult<CombinedResult> {
        let credential = resolve_credential(credential, self.credential.as_deref())?;

        if analyses.failed_count() > 0 {
            debug!(
                failed = analyses.failed_count(),
                "Merging with placeholder text for failed views"
            );
        }

        let timeline = self
            .model
            .generate(&credential, &ModelRequest::text(merge_prompt(analyses)))
            .await?;
        info!(lines = timeline.lines().count(), "Merged timeline generated");

        let summary = self
            .model
            .generate(&credential, &ModelRequest::text(summary_prompt(&timeline)))
            .await?;

        Ok(CombinedResult { summary, timeline })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeminiError;
    use crate::testing::ScriptedModel;
    use quadcam_models::{CameraView, ViewOutcome};

    fn analyses() -> ViewAnalyses {
        CameraView::ALL
            .iter()
            .map(|v| (*v, ViewOutcome::completed(format!("00:00–00:03 : {} moves", v))))
            .collect()
    }

    #[tokio::test]
    async fn test_merge_makes_timeline_then_summary_call() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("00:00–00:03 : Both arms move.".to_string()),
            Ok("The robot moved both arms.".to_string()),
        ]));
        let merger = Merger::new(model.clone(), &GeminiConfig::default().with_api_key("k"));

        let combined = merger.merge(&analyses(), None).await.unwrap();

        assert_eq!(combined.timeline, "00:00–00:03 : Both arms move.");
        assert_eq!(combined.summary, "The robot moved both arms.");

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, r)| r.video.is_none()));
        assert!(calls[0].1.prompt.contains("Top view segments:\n00:00–00:03 : top moves"));
        assert!(calls[1]
            .1
            .prompt
            .contains("Action sequence:\n00:00–00:03 : Both arms move."));
    }

    #[tokio::test]
    async fn test_merge_missing_credential_makes_no_call() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("unused".to_string())]));
        let merger = Merger::new(model.clone(), &GeminiConfig::default());

        let err = merger.merge(&analyses(), None).await.unwrap_err();
        assert!(matches!(err, GeminiError::MissingCredential));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_merge_does_not_retry() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(GeminiError::api(503, "overloaded")),
            Ok("never reached".to_string()),
        ]));
        let merger = Merger::new(model.clone(), &GeminiConfig::default());

        let err = merger.merge(&analyses(), Some("explicit")).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(model.call_count(), 1);
        assert_eq!(model.calls()[0].0, "explicit");
    }

    #[tokio::test]
    async fn test_summary_failure_propagates() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("timeline".to_string()),
            Err(GeminiError::api(400, "bad")),
        ]));
        let merger = Merger::new(model.clone(), &GeminiConfig::default().with_api_key("k"));

        assert!(merger.merge(&analyses(), None).await.is_err());
        assert_eq!(model.call_count(), 2);
    }
}
