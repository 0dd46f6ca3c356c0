//! FFmpeg CLI wrapper for four-camera recordings.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - FFprobe video information
//! - Quadrant splitting into four per-view videos
//! - Single-frame JPEG extraction by timestamp
//! - Streaming HTTP download of remote recordings

pub mod command;
pub mod download;
pub mod error;
pub mod frame;
pub mod fs_utils;
pub mod inspect;
pub mod split;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use download::download_to_file;
pub use error::{MediaError, MediaResult};
pub use frame::{extract_frame, frame_index_for_timestamp};
pub use fs_utils::{ensure_dir, file_stem, remove_file_quietly, sanitize_filename};
pub use inspect::{inspect_video, VideoInfo};
pub use split::{
    encoder_pixel_format, CropRect, QuadrantLayout, SplitConfig, SplitOutput,
    VideoSplitter,
};
