//! Prompt templates for view analysis, timeline merging and summaries.

use quadcam_models::{CameraView, ViewAnalyses};

/// Shown in the merge prompt for a view with no usable analysis.
pub const MISSING_ANALYSIS: &str = "No analysis available";

const UP_PROMPT: &str = "This video is captured from an overhead camera. Provide the most detailed description possible of all movements, spatial relationships between objects, relative displacements, angle changes, and sense of speed, and note any observable changes in object state (e.g., opening, locking, deformation, tension).";

const FRONT_PROMPT: &str = "This video is captured from a front-facing camera. Provide the most detailed description possible of the action sequence, including each arm's motion trajectory, the sense of gripping force, changes in object surface characteristics, and any subtle adjustments in object orientation, angle, or position.";

const LEFT_PROMPT: &str = "This video is captured by a camera mounted on the left robotic arm. From the left-arm perspective, provide a thorough description of each extension, rotation, and gripping action, focusing on any deformation, posture changes, and relative position shifts of objects upon contact, as well as changes in the left arm's joint angles.";

const RIGHT_PROMPT: &str = "This video is captured by a camera mounted on the right robotic arm. From the right-arm perspective, provide a thorough description of each movement, gripping action, direction and magnitude of applied force, and describe any changes in object state, including position, orientation, locking, or any physical interactions.";

const SEGMENT_PROMPT: &str = "Split the video into the finest-grained action segments, each focusing on one distinct action, and include the following details:
1. Time range (MM:SS–MM:SS)
2. Actor (left arm, right arm, or both)
3. Target object and any relevant properties (material, shape, etc.)
4. Motion trajectory, sense of speed, and direction of force
5. Any changes in object state or position (e.g., locked, released, rotated, displaced)

6. Output ONLY the unified list, one segment per line, with no extra text.

Example:
00:00–00:03 : The left robotic arm moves along a straight trajectory toward the center, grasps the translucent plastic container with slight locking pressure.
00:03–00:06 : The right robotic arm rotates clockwise by 45° at a slow pace, pushing a Duracell battery into the compartment until an audible click.
00:06–00:09 : Both arms lift upward and retract in synchronization, leaving the closed battery compartment behind.";

const MERGE_PREAMBLE: &[&str] = &[
    "You have four synchronized camera views of the same action sequence, each providing time-stamped segments in MM:SS–MM:SS : description format:",
    "- Top: overhead view",
    "- Front: frontal view",
    "- Right: camera on the right robotic arm",
    "- Left: camera on the left robotic arm",
    "",
    "Generate a single chronological list of unified action segments with these rules:",
    "1. Order by start time (then end time).",
    "2. When segments share identical times, merge their information into one description without view labels.",
    "3. Merge overlapping segments only if they describe the same continuous motion—use the earliest start, latest end, and combine details.",
    "4. Do not separate actions by individual arms; describe arm actions collectively (e.g., 'Both arms pick up…').",
    "5. Keep segments granular: start a new segment whenever the action changes (e.g., moving vs. grasping vs. placing).",
    "6. Preserve the exact MM:SS–MM:SS format.",
    "7. Ensure no two segments start at the same timestamp: if two would share a start, set the later one's start to the earlier segment's end.",
    "8. Output ONLY the unified list, one segment per line, with no extra text.",
    "",
    "# Expected unified output:",
    "00:00–00:06 : Both arms pick up an AA Duracell battery and insert it into the battery compartment.",
    "00:06–00:09 : Left arms pick up a second AA Duracell battery and insert it into the battery compartment.",
    "00:09–00:14 : Right arms retract upward, Right arm rotates slightly, and close the battery compartment door.",
    "00:14–00:17 : Both arms move away from the closed battery compartment.",
];

/// View-specific instruction for a prompt label (`up`, `front`, `left`, `right`).
pub fn view_instruction(label: &str) -> Option<&'static str> {
    match label {
        "up" => Some(UP_PROMPT),
        "front" => Some(FRONT_PROMPT),
        "left" => Some(LEFT_PROMPT),
        "right" => Some(RIGHT_PROMPT),
        _ => None,
    }
}

/// Analysis prompt: the view instruction (when the label is known), a blank
/// line, then the segment format instruction.
pub fn analysis_prompt(label: Option<&str>) -> String {
    match label.and_then(view_instruction) {
        Some(view) => format!("{}\n\n{}", view, SEGMENT_PROMPT),
        None => SEGMENT_PROMPT.to_string(),
    }
}

/// Merge prompt listing every view's segments in top, front, right, left order.
pub fn merge_prompt(analyses: &ViewAnalyses) -> String {
    let mut lines: Vec<String> = MERGE_PREAMBLE.iter().map(|l| l.to_string()).collect();

    for view in [
        CameraView::Top,
        CameraView::Front,
        CameraView::Right,
        CameraView::Left,
    ] {
        lines.push(format!("\n{} view segments:", view.display_name()));
        match analyses.text(view).filter(|t| !t.trim().is_empty()) {
            Some(text) => lines.push(text.to_string()),
            None => lines.push(MISSING_ANALYSIS.to_string()),
        }
    }

    lines.join("\n")
}

/// Summary prompt for a merged timeline.
pub fn summary_prompt(timeline: &str) -> String {
    format!(
        "Based on the following detailed action sequence from a robot manipulation video, provide a concise English summary of what the robot did in this video. Focus on the main actions and their purpose.\n\nAction sequence:\n{}\n\nPlease provide a brief summary in 2-3 sentences, focusing on the key actions and their purpose.",
        timeline
    )
}
