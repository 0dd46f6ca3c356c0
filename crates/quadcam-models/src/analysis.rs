//! Analysis result models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::view::CameraView;

/// Outcome of analyzing a single camera view.
///
/// A failed view is data, not an error: the batch keeps going and the merge
/// step sees which views are missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewOutcome {
    /// The model returned a description for this view.
    Completed {
        /// Raw model text, loosely `MM:SS–MM:SS : description` lines
        text: String,
    },
    /// The view could not be analyzed.
    Failed {
        /// Human-readable failure reason
        reason: String,
    },
}

impl ViewOutcome {
    pub fn completed(text: impl Into<String>) -> Self {
        Self::Completed { text: text.into() }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Model text, if the analysis succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            ViewOutcome::Completed { text } => Some(text),
            ViewOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ViewOutcome::Failed { .. })
    }
}

/// Per-view analysis results for one recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ViewAnalyses(BTreeMap<CameraView, ViewOutcome>);

impl ViewAnalyses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, view: CameraView, outcome: ViewOutcome) {
        self.0.insert(view, outcome);
    }

    pub fn get(&self, view: CameraView) -> Option<&ViewOutcome> {
        self.0.get(&view)
    }

    /// Model text for a view, `None` when absent or failed.
    pub fn text(&self, view: CameraView) -> Option<&str> {
        self.get(view).and_then(ViewOutcome::text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of views that failed.
    pub fn failed_count(&self) -> usize {
        self.0.values().filter(|o| o.is_failed()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraView, &ViewOutcome)> {
        self.0.iter().map(|(v, o)| (*v, o))
    }
}

impl FromIterator<(CameraView, ViewOutcome)> for ViewAnalyses {
    fn from_iter<I: IntoIterator<Item = (CameraView, ViewOutcome)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Merged timeline and summary for the whole recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CombinedResult {
    /// Two or three sentence overview
    pub summary: String,
    /// Chronological action segments, one per line
    pub timeline: String,
}
