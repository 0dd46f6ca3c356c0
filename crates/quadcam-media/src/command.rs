//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Standard input/output pseudo-path understood by FFmpeg.
pub const PIPE_STDIN: &str = "pipe:0";
pub const PIPE_STDOUT: &str = "pipe:1";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path (or `pipe:0`)
    input: PathBuf,
    /// Output file path (or `pipe:1`)
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Declare the input as headerless RGB24 frames of the given size and rate.
    pub fn raw_rgb_input(self, width: u32, height: u32, frame_rate: &str) -> Self {
        self.input_arg("-f")
            .input_arg("rawvideo")
            .input_arg("-pix_fmt")
            .input_arg("rgb24")
            .input_arg("-s")
            .input_arg(format!("{}x{}", width, height))
            .input_arg("-r")
            .input_arg(frame_rate)
    }

    /// Emit headerless RGB24 frames, one per decoded input frame.
    ///
    /// Frames keep their stored orientation; display-matrix rotation is not
    /// applied, so their size always matches the reported stream size.
    pub fn raw_rgb_output(self) -> Self {
        self.input_arg("-noautorotate").output_args([
            "-map",
            "0:v:0",
            "-fps_mode",
            "passthrough",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
        ])
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set output pixel format.
    pub fn pixel_format(self, pix_fmt: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(pix_fmt)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Drop audio streams.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Extract single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push("error".to_string());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands that write to a file.
#[derive(Debug, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self
    }

    /// Run an FFmpeg command to completion, capturing stderr for diagnostics.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?
            .wait_with_output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                non_empty_stderr(&output.stderr),
                output.status.code(),
            ))
        }
    }
}

/// Spawn FFmpeg with piped stdio for frame streaming.
///
/// The child is killed if dropped before being waited on.
pub fn spawn_piped(cmd: &FfmpegCommand) -> MediaResult<Child> {
    check_ffmpeg()?;

    let args = cmd.build_args();
    debug!("Spawning FFmpeg: ffmpeg {}", args.join(" "));

    let child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    Ok(child)
}

/// Trimmed stderr text, `None` when FFmpeg printed nothing.
pub(crate) fn non_empty_stderr(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .video_codec("libx264")
            .preset("veryfast")
            .crf(18);

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"18".to_string()));
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_raw_input_args_precede_input() {
        let args = FfmpegCommand::new(PIPE_STDIN, "cam.mp4")
            .raw_rgb_input(480, 720, "30000/1001")
            .build_args();

        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let size_pos = args.iter().position(|a| a == "480x720").unwrap();
        let rate_pos = args.iter().position(|a| a == "30000/1001").unwrap();
        assert!(size_pos < input_pos);
        assert!(rate_pos < input_pos);
        assert_eq!(args[input_pos + 1], PIPE_STDIN);
    }

    #[test]
    fn test_raw_output_uses_passthrough_timing() {
        let args = FfmpegCommand::new("in.mp4", PIPE_STDOUT)
            .raw_rgb_output()
            .build_args();

        let mode_pos = args.iter().position(|a| a == "-fps_mode").unwrap();
        assert_eq!(args[mode_pos + 1], "passthrough");
        assert!(args.contains(&"rgb24".to_string()));
        assert_eq!(args.last().unwrap(), PIPE_STDOUT);
    }

    #[test]
    fn test_raw_output_disables_autorotate_on_input() {
        let args = FfmpegCommand::new("rotated.mov", PIPE_STDOUT)
            .raw_rgb_output()
            .build_args();

        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let flag_pos = args
            .iter()
            .position(|a| a == "-noautorotate")
            .expect("decoder must not autorotate");
        // Input option, so it has to come before -i
        assert!(flag_pos < input_pos);
        assert_eq!(args[input_pos + 1], "rotated.mov");
    }

    #[test]
    fn test_non_empty_stderr() {
        assert_eq!(non_empty_stderr(b"  \n"), None);
        assert_eq!(
            non_empty_stderr(b"Invalid data\n").as_deref(),
            Some("Invalid data")
        );
    }
}
