//! Single-frame extraction by timestamp.

use std::path::Path;

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::inspect::inspect_video;

/// Frame index shown at `timestamp` seconds: `floor(timestamp * fps)`.
pub fn frame_index_for_timestamp(timestamp: f64, fps: f64) -> MediaResult<u64> {
    if !timestamp.is_finite() || timestamp < 0.0 {
        return Err(MediaError::InvalidTimestamp(format!(
            "{} is not a non-negative number of seconds",
            timestamp
        )));
    }
    Ok((timestamp * fps).floor() as u64)
}

/// Decode the frame at `timestamp` and return it as JPEG bytes.
///
/// Fails with [`MediaError::FrameNotFound`] when the index lies at or past
/// the end of the video.
pub async fn extract_frame(video_path: impl AsRef<Path>, timestamp: f64) -> MediaResult<Vec<u8>> {
    let video_path = video_path.as_ref();

    let info = inspect_video(video_path).await?;
    let index = frame_index_for_timestamp(timestamp, info.fps)?;
    if index >= info.total_frames() {
        return Err(MediaError::FrameNotFound { index, timestamp });
    }

    let workdir = tempfile::tempdir()?;
    let output = workdir.path().join(format!("frame_{}.jpg", index));

    let cmd = FfmpegCommand::new(video_path, &output)
        .video_filter(format!("select=eq(n\\,{})", index))
        .output_args(["-fps_mode", "vfr", "-q:v", "2"])
        .single_frame();

    FfmpegRunner::new().run(&cmd).await?;

    // FFmpeg exits cleanly without writing anything when the select filter
    // never matches (frame counts from container metadata can overshoot).
    let bytes = match tokio::fs::read(&output).await {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => return Err(MediaError::FrameNotFound { index, timestamp }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::FrameNotFound { index, timestamp })
        }
        Err(e) => return Err(e.into()),
    };

    debug!(
        video = %video_path.display(),
        index,
        bytes = bytes.len(),
        "Extracted frame"
    );

    Ok(bytes)
}
