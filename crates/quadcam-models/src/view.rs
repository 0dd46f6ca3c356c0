//! Camera view definitions.
//!
//! A source recording holds four camera feeds laid side by side. Each feed is
//! identified by a [`CameraView`], which fixes its quadrant position, its
//! output filename suffix and the label used to select prompt text.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the four synchronized camera perspectives.
///
/// Declaration order matches quadrant order, so sorted collections keyed by
/// `CameraView` iterate top, front, right, left.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CameraView {
    /// Overhead camera (quadrant 0)
    Top,
    /// Front-facing camera, mounted sideways (quadrant 1)
    Front,
    /// Camera on the right robotic arm (quadrant 2)
    Right,
    /// Camera on the left robotic arm (quadrant 3)
    Left,
}

impl CameraView {
    /// All views in quadrant order.
    pub const ALL: [CameraView; 4] = [
        CameraView::Top,
        CameraView::Front,
        CameraView::Right,
        CameraView::Left,
    ];

    /// Zero-based quadrant index, counted from the left edge of the frame.
    pub fn quadrant_index(&self) -> usize {
        match self {
            CameraView::Top => 0,
            CameraView::Front => 1,
            CameraView::Right => 2,
            CameraView::Left => 3,
        }
    }

    /// View stored at the given quadrant index.
    pub fn from_quadrant_index(index: usize) -> Option<CameraView> {
        Self::ALL.get(index).copied()
    }

    /// Whether this view is rotated 90° clockwise after cropping.
    pub fn is_rotated(&self) -> bool {
        matches!(self, CameraView::Front)
    }

    /// Filename suffix of the separated video (`_cam1` .. `_cam4`).
    pub fn file_suffix(&self) -> &'static str {
        match self {
            CameraView::Top => "_cam1",
            CameraView::Front => "_cam2",
            CameraView::Right => "_cam3",
            CameraView::Left => "_cam4",
        }
    }

    /// Label selecting the view-specific analysis instruction.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            CameraView::Top => "up",
            CameraView::Front => "front",
            CameraView::Right => "right",
            CameraView::Left => "left",
        }
    }

    /// Key used in JSON payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraView::Top => "top",
            CameraView::Front => "front",
            CameraView::Right => "right",
            CameraView::Left => "left",
        }
    }

    /// Capitalized name used in prompt headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            CameraView::Top => "Top",
            CameraView::Front => "Front",
            CameraView::Right => "Right",
            CameraView::Left => "Left",
        }
    }
}

impl fmt::Display for CameraView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CameraView {
    type Err = ViewParseError;

    /// Accepts both payload keys and prompt labels (`up` is an alias of `top`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" | "up" => Ok(CameraView::Top),
            "front" => Ok(CameraView::Front),
            "right" => Ok(CameraView::Right),
            "left" => Ok(CameraView::Left),
            _ => Err(ViewParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown camera view: {0}")]
pub struct ViewParseError(String);
