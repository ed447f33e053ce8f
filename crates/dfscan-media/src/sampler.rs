//! Evenly spaced frame sampling.
//!
//! A video is reduced to at most `K` representative stills. Indices are a
//! pure function of the frame count, so the same file always yields the same
//! frames. Each frame is decoded by a bounded FFmpeg run into a uniquely
//! named JPEG; frames that fail to decode are skipped.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;
use crate::unit::MediaUnit;

/// Frames sampled per video unless configured otherwise.
pub const DEFAULT_MAX_FRAMES: usize = 5;

/// Frame indices to sample from a video with `frame_count` frames.
///
/// Every frame when `frame_count <= max_frames`, otherwise
/// `floor(i * frame_count / max_frames)` for `i` in `0..max_frames`. Index 0
/// is always included, the last frame is not guaranteed.
pub fn frame_indices(frame_count: u64, max_frames: usize) -> Vec<u64> {
    let k = max_frames as u64;
    if frame_count <= k {
        return (0..frame_count).collect();
    }

    (0..k).map(|i| i * frame_count / k).collect()
}

/// Extracts representative frames from a video.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    max_frames: usize,
    runner: FfmpegRunner,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAMES, Duration::from_secs(30))
    }
}

impl FrameSampler {
    pub fn new(max_frames: usize, ffmpeg_timeout: Duration) -> Self {
        Self {
            max_frames,
            runner: FfmpegRunner::new().with_timeout(ffmpeg_timeout),
        }
    }

    /// Sample frames from `video_path` into `out_dir`.
    ///
    /// Returns an empty Vec when the video can't be opened; callers treat
    /// that as "no face detected". Units come back in frame order.
    pub async fn sample(&self, video_path: &Path, out_dir: &Path) -> Vec<MediaUnit> {
        let info = match probe_video(video_path).await {
            Ok(info) => info,
            Err(e) => {
                warn!(video = %video_path.display(), "Could not open video: {}", e);
                return Vec::new();
            }
        };

        let indices = frame_indices(info.frame_count, self.max_frames);
        info!(
            video = %video_path.display(),
            frame_count = info.frame_count,
            fps = info.fps,
            duration = info.duration,
            "Sampling frames at indices {:?}",
            indices
        );

        let mut units = Vec::with_capacity(indices.len());
        for (position, &index) in indices.iter().enumerate() {
            match self.extract_frame(video_path, index, info.fps, out_dir).await {
                Ok(unit) => {
                    debug!(
                        frame_index = index,
                        path = %unit.path().display(),
                        "Extracted frame {}/{}",
                        position + 1,
                        indices.len()
                    );
                    units.push(unit);
                }
                Err(e) => {
                    warn!(frame_index = index, "Skipping frame: {}", e);
                }
            }
        }

        units
    }

    /// Decode the frame at `index` into a new temporary JPEG.
    pub async fn extract_frame(
        &self,
        video_path: &Path,
        index: u64,
        fps: f64,
        out_dir: &Path,
    ) -> MediaResult<MediaUnit> {
        let output = out_dir.join(format!("frame_{}.jpg", Uuid::new_v4()));
        // Owning the path up front means a failed run cleans up its partial file
        let unit = MediaUnit::extracted_frame(&output, index);

        let cmd = FfmpegCommand::new(video_path, &output)
            .seek(index as f64 / fps)
            .single_frame()
            .jpeg_quality(2);

        self.runner
            .run(&cmd)
            .await
            .map_err(|e| MediaError::decode_failed(index, e.to_string()))?;

        // FFmpeg exits 0 without writing anything when seeking past the end
        let written = tokio::fs::metadata(&output)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !written {
            return Err(MediaError::decode_failed(index, "no frame decoded at this position"));
        }

        Ok(unit)
    }
}
