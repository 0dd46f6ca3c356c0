//! Quadrant splitting of four-camera recordings.
//!
//! A source frame holds four camera feeds side by side. Every frame is cut
//! into four vertical strips of `floor(width / 4)` columns; the strip at
//! quadrant 1 (the front camera, mounted sideways) is rotated 90° clockwise.
//! Columns beyond `4 * floor(width / 4)` are dropped.
//!
//! Frames are streamed one at a time: a single FFmpeg decoder emits raw RGB
//! frames, each frame is cropped in memory, and the four strips are piped
//! into four FFmpeg encoders.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::{imageops, RgbImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tracing::{debug, info, warn};

use quadcam_models::{CameraView, SeparatedVideos};

use crate::command::{non_empty_stderr, spawn_piped, FfmpegCommand, PIPE_STDIN, PIPE_STDOUT};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{ensure_dir, file_stem};
use crate::inspect::{inspect_video, VideoInfo};

/// Default directory for separated videos.
pub const DEFAULT_OUTPUT_DIR: &str = "separated_videos";

/// Splitter configuration.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Directory receiving the four per-view videos
    pub output_dir: PathBuf,
    /// Encoder for the per-view videos
    pub video_codec: String,
    /// Encoder preset
    pub preset: String,
    /// Encoder quality
    pub crf: u8,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
        }
    }
}

impl SplitConfig {
    /// Default encoder settings writing into `output_dir`.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }
}

/// Region of the source frame copied into one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fixed four-strip geometry for a given source resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadrantLayout {
    source_width: u32,
    source_height: u32,
    strip_width: u32,
}

impl QuadrantLayout {
    /// Compute the layout for a source frame.
    ///
    /// Fails when the frame is too narrow to yield four non-empty strips.
    pub fn new(source_width: u32, source_height: u32) -> MediaResult<Self> {
        let strip_width = source_width / 4;
        if strip_width == 0 || source_height == 0 {
            return Err(MediaError::invalid_video(format!(
                "Frame {}x{} is too small to split into four views",
                source_width, source_height
            )));
        }

        Ok(Self {
            source_width,
            source_height,
            strip_width,
        })
    }

    /// Width of every strip before rotation.
    pub fn strip_width(&self) -> u32 {
        self.strip_width
    }

    /// Right-edge columns that belong to no strip.
    pub fn discarded_columns(&self) -> u32 {
        self.source_width - 4 * self.strip_width
    }

    /// Source region of a view.
    pub fn crop_rect(&self, view: CameraView) -> CropRect {
        CropRect {
            x: view.quadrant_index() as u32 * self.strip_width,
            y: 0,
            width: self.strip_width,
            height: self.source_height,
        }
    }

    /// Encoded `(width, height)` of a view; swapped for the rotated view.
    pub fn output_dimensions(&self, view: CameraView) -> (u32, u32) {
        if view.is_rotated() {
            (self.source_height, self.strip_width)
        } else {
            (self.strip_width, self.source_height)
        }
    }

    /// Cut one view out of a source frame.
    pub fn extract(&self, frame: &RgbImage, view: CameraView) -> RgbImage {
        let rect = self.crop_rect(view);
        let strip = imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image();
        if view.is_rotated() {
            imageops::rotate90(&strip)
        } else {
            strip
        }
    }
}

/// Chroma layout for an encoded view.
///
/// 4:2:0 needs even dimensions; odd strip sizes keep full chroma instead of
/// being resized.
pub fn encoder_pixel_format(width: u32, height: u32) -> &'static str {
    if width % 2 == 0 && height % 2 == 0 {
        "yuv420p"
    } else {
        "yuv444p"
    }
}

/// Result of one split.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    /// Source stream information
    pub source: VideoInfo,
    /// Geometry used for every frame
    pub layout: QuadrantLayout,
    /// Per-view output paths
    pub videos: SeparatedVideos,
    /// Frames written to each view
    pub frames_written: u64,
}

/// Splits four-camera recordings into per-view videos.
#[derive(Debug, Clone, Default)]
pub struct VideoSplitter {
    config: SplitConfig,
}

struct ViewEncoder {
    view: CameraView,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl VideoSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split `input` into four view videos under the configured directory.
    pub async fn split(&self, input: impl AsRef<Path>) -> MediaResult<SplitOutput> {
        let input = input.as_ref();
        let started = Instant::now();

        ensure_dir(&self.config.output_dir).await?;

        let source = inspect_video(input).await?;
        let layout = QuadrantLayout::new(source.width, source.height)?;
        if layout.discarded_columns() > 0 {
            debug!(
                width = source.width,
                dropped = layout.discarded_columns(),
                "Source width not divisible by 4, dropping right-edge columns"
            );
        }

        let stem = file_stem(input);
        let videos = SeparatedVideos::for_stem(&self.config.output_dir, &stem);

        info!(
            input = %input.display(),
            width = source.width,
            height = source.height,
            fps = source.fps,
            "Splitting video into four views"
        );

        let decode_cmd = FfmpegCommand::new(input, PIPE_STDOUT).raw_rgb_output();
        let mut decoder = spawn_piped(&decode_cmd)?;
        // Decoder reads from the file, not stdin.
        drop(decoder.stdin.take());
        let stdout = decoder
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("Failed to capture FFmpeg decoder stdout"))?;
        let mut reader = BufReader::new(stdout);

        let mut encoders = Vec::with_capacity(CameraView::ALL.len());
        for view in CameraView::ALL {
            let path = videos
                .get(view)
                .ok_or_else(|| MediaError::internal(format!("No output path for {} view", view)))?;
            encoders.push(self.spawn_encoder(&layout, &source.frame_rate, view, path)?);
        }

        // Decoded in stored orientation, so every frame matches the reported size.
        let mut frame = RgbImage::new(source.width, source.height);
        let mut frames_written = 0u64;
        let mut write_failure: Option<(CameraView, std::io::Error)> = None;

        'frames: loop {
            match reader.read_exact(&mut frame).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            for encoder in &mut encoders {
                let strip = layout.extract(&frame, encoder.view);
                let Some(stdin) = encoder.stdin.as_mut() else {
                    continue;
                };
                if let Err(e) = stdin.write_all(strip.as_raw()).await {
                    write_failure = Some((encoder.view, e));
                    break 'frames;
                }
            }

            frames_written += 1;
        }

        // Closing stdin lets each encoder flush and finalize its file.
        for encoder in &mut encoders {
            if let Some(mut stdin) = encoder.stdin.take() {
                if let Err(e) = stdin.shutdown().await {
                    debug!(view = %encoder.view, "Encoder stdin already closed: {}", e);
                }
            }
        }

        let mut first_error = None;
        for encoder in encoders {
            let view = encoder.view;
            let output = encoder.child.wait_with_output().await?;
            if !output.status.success() && first_error.is_none() {
                first_error = Some(MediaError::ffmpeg_failed(
                    format!("Encoding {} view failed", view),
                    non_empty_stderr(&output.stderr),
                    output.status.code(),
                ));
            }
        }

        drop(reader);
        if write_failure.is_some() {
            // Stop decoding; nothing will consume the remaining frames.
            let _ = decoder.start_kill();
        }
        let decoded = decoder.wait_with_output().await?;

        if let Some(err) = first_error {
            return Err(err);
        }
        if let Some((view, e)) = write_failure {
            return Err(MediaError::ffmpeg_failed(
                format!("Encoder for {} view stopped accepting frames: {}", view, e),
                None,
                None,
            ));
        }
        if !decoded.status.success() {
            return Err(MediaError::ffmpeg_failed(
                format!("Decoding {} failed", input.display()),
                non_empty_stderr(&decoded.stderr),
                decoded.status.code(),
            ));
        }

        if frames_written == 0 {
            warn!(input = %input.display(), "Decoder produced no frames");
        }

        info!(
            input = %input.display(),
            frames = frames_written,
            duration_ms = started.elapsed().as_millis() as u64,
            "Video split complete"
        );

        Ok(SplitOutput {
            source,
            layout,
            videos,
            frames_written,
        })
    }

    fn spawn_encoder(
        &self,
        layout: &QuadrantLayout,
        frame_rate: &str,
        view: CameraView,
        output: &Path,
    ) -> MediaResult<ViewEncoder> {
        let (width, height) = layout.output_dimensions(view);
        let cmd = FfmpegCommand::new(PIPE_STDIN, output)
            .raw_rgb_input(width, height, frame_rate)
            .no_audio()
            .video_codec(&self.config.video_codec)
            .preset(&self.config.preset)
            .crf(self.config.crf)
            .pixel_format(encoder_pixel_format(width, height))
            .output_arg("-movflags")
            .output_arg("+faststart");

        let mut child = spawn_piped(&cmd)?;
        let stdin = child.stdin.take();
        // Encoders write to a file; their stdout is unused.
        drop(child.stdout.take());

        debug!(view = %view, width, height, output = %output.display(), "Spawned view encoder");

        Ok(ViewEncoder { view, child, stdin })
    }
}
