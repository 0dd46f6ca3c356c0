//! FFprobe video information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::{check_ffprobe, non_empty_stderr};
use crate::error::{MediaError, MediaResult};

/// Video file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Frame rate as reported by FFprobe (e.g. "30000/1001")
    pub frame_rate: String,
    /// Number of video frames, when the container records it
    pub frame_count: Option<u64>,
    /// Video codec
    pub codec: String,
}

impl VideoInfo {
    /// Frame count, falling back to duration × fps when the container
    /// does not record `nb_frames`.
    pub fn total_frames(&self) -> u64 {
        self.frame_count
            .unwrap_or_else(|| (self.duration * self.fps).floor().max(0.0) as u64)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Read stream information from a video file with FFprobe.
pub async fn inspect_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("Cannot open video file: {}", path.display()),
            stderr: non_empty_stderr(&output.stderr),
        });
    }

    parse_ffprobe_output(&output.stdout)
}

/// Turn FFprobe JSON into [`VideoInfo`].
fn parse_ffprobe_output(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let parsed: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::invalid_video("No video stream found"))?;

    let width = video_stream.width.unwrap_or(0);
    let height = video_stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(MediaError::invalid_video(format!(
            "Video stream has no usable dimensions ({}x{})",
            width, height
        )));
    }

    // Prefer the stream duration; container duration may include audio tail.
    let duration = video_stream
        .duration
        .as_ref()
        .or(parsed.format.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let (frame_rate, fps) = [&video_stream.avg_frame_rate, &video_stream.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|r| parse_frame_rate(r).map(|fps| (r.clone(), fps)))
        .ok_or_else(|| MediaError::invalid_video("Video stream has no frame rate"))?;

    let frame_count = video_stream
        .nb_frames
        .as_ref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0);

    Ok(VideoInfo {
        duration,
        width,
        height,
        fps,
        frame_rate,
        frame_count,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
///
/// Returns `None` for zero or undefined rates such as "0/0".
fn parse_frame_rate(s: &str) -> Option<f64> {
    let fps = if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        s.parse().ok()?
    };

    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("n/a").is_none());
    }

    #[test]
    fn test_parse_ffprobe_output() {
        let json = br#"{
            "format": {"duration": "10.5"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 2560, "height": 720,
                 "r_frame_rate": "30/1", "avg_frame_rate": "0/0", "nb_frames": "300",
                 "duration": "10.000000"}
            ]
        }"#;

        let info = parse_ffprobe_output(json).unwrap();
        assert_eq!(info.width, 2560);
        assert_eq!(info.height, 720);
        assert_eq!(info.frame_rate, "30/1");
        assert!((info.fps - 30.0).abs() < f64::EPSILON);
        assert_eq!(info.frame_count, Some(300));
        assert!((info.duration - 10.0).abs() < f64::EPSILON);
        assert_eq!(info.codec, "h264");
    }

    #[test]
    fn test_parse_ffprobe_output_without_video() {
        let json = br#"{"format": {}, "streams": [{"codec_type": "audio"}]}"#;
        assert!(matches!(
            parse_ffprobe_output(json),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[test]
    fn test_total_frames_falls_back_to_duration() {
        let info = VideoInfo {
            duration: 2.5,
            width: 8,
            height: 4,
            fps: 24.0,
            frame_rate: "24/1".to_string(),
            frame_count: None,
            codec: "h264".to_string(),
        };
        assert_eq!(info.total_frames(), 60);
    }
}
