//! Recording and processing run models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::analysis::{CombinedResult, ViewAnalyses};
use crate::view::CameraView;

/// Unique identifier for one split → analyze → merge run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string, e.g. a propagated request ID.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Paths of the four per-view videos produced by one split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SeparatedVideos(BTreeMap<CameraView, PathBuf>);

impl SeparatedVideos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conventional output path for a view: `<dir>/<stem><suffix>.mp4`.
    pub fn output_path(output_dir: &Path, stem: &str, view: CameraView) -> PathBuf {
        output_dir.join(format!("{}{}.mp4", stem, view.file_suffix()))
    }

    /// Build the full four-view mapping for a source stem.
    pub fn for_stem(output_dir: &Path, stem: &str) -> Self {
        CameraView::ALL
            .iter()
            .map(|view| (*view, Self::output_path(output_dir, stem, *view)))
            .collect()
    }

    pub fn insert(&mut self, view: CameraView, path: PathBuf) {
        self.0.insert(view, path);
    }

    pub fn get(&self, view: CameraView) -> Option<&Path> {
        self.0.get(&view).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraView, &Path)> {
        self.0.iter().map(|(v, p)| (*v, p.as_path()))
    }
}

impl FromIterator<(CameraView, PathBuf)> for SeparatedVideos {
    fn from_iter<I: IntoIterator<Item = (CameraView, PathBuf)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Full result of processing one uploaded recording.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingReport {
    pub message: String,
    /// Name of the uploaded or downloaded source file
    pub filename: String,
    pub separated_videos: SeparatedVideos,
    pub analysis_results: ViewAnalyses,
    pub combined_result: CombinedResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_stem_uses_cam_suffixes() {
        let videos = SeparatedVideos::for_stem(Path::new("out"), "demo");
        assert_eq!(videos.len(), 4);
        assert_eq!(
            videos.get(CameraView::Top).unwrap(),
            Path::new("out/demo_cam1.mp4")
        );
        assert_eq!(
            videos.get(CameraView::Front).unwrap(),
            Path::new("out/demo_cam2.mp4")
        );
        assert_eq!(
            videos.get(CameraView::Right).unwrap(),
            Path::new("out/demo_cam3.mp4")
        );
        assert_eq!(
            videos.get(CameraView::Left).unwrap(),
            Path::new("out/demo_cam4.mp4")
        );
    }

    #[test]
    fn test_separated_videos_serialize_as_map() {
        let videos = SeparatedVideos::for_stem(Path::new("sv"), "a");
        let json = serde_json::to_value(&videos).unwrap();
        assert_eq!(json["front"], "sv/a_cam2.mp4");
    }

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
        assert_eq!(RunId::from_string("req-1").as_str(), "req-1");
    }
}
