//! FFmpeg CLI wrapper for frame sampling.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with bounded runs
//! - FFprobe container inspection (frame count, fps)
//! - Media kind detection for uploads
//! - Deterministic, evenly spaced frame sampling into temporary images
//! - `MediaUnit`, the still image handed to the remote adapters

pub mod command;
pub mod error;
pub mod kind;
pub mod probe;
pub mod sampler;
pub mod unit;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use kind::{media_kind, mime_type, MediaKind, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
pub use probe::{probe_video, VideoInfo};
pub use sampler::{frame_indices, FrameSampler, DEFAULT_MAX_FRAMES};
pub use unit::{MediaOrigin, MediaUnit};
