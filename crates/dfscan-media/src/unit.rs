//! Media units handed to the remote adapters.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, warn};

/// Where a media unit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOrigin {
    /// The uploaded photo itself
    Original,
    /// A frame decoded from a video at the given index
    ExtractedFrame { index: u64 },
}

/// One still image to be analyzed.
///
/// Extracted frames own their file: it is deleted by [`MediaUnit::release`],
/// or when the unit is dropped (e.g. the request was cancelled). Originals
/// are never deleted.
#[derive(Debug)]
pub struct MediaUnit {
    path: PathBuf,
    origin: MediaOrigin,
    temp: Option<TempPath>,
}

impl MediaUnit {
    /// Wrap an uploaded photo.
    pub fn original(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            origin: MediaOrigin::Original,
            temp: None,
        }
    }

    /// Take ownership of a frame written to `path`.
    pub fn extracted_frame(path: impl Into<PathBuf>, index: u64) -> Self {
        let path = path.into();
        Self {
            temp: Some(TempPath::from_path(path.clone())),
            path,
            origin: MediaOrigin::ExtractedFrame { index },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> MediaOrigin {
        self.origin
    }

    /// Source frame index for extracted frames.
    pub fn frame_index(&self) -> Option<u64> {
        match self.origin {
            MediaOrigin::ExtractedFrame { index } => Some(index),
            MediaOrigin::Original => None,
        }
    }

    /// Whether the file is deleted after use.
    pub fn is_ephemeral(&self) -> bool {
        self.temp.is_some()
    }

    /// Delete the backing file if ephemeral. Failures are logged, never returned.
    pub fn release(self) {
        let Some(temp) = self.temp else {
            return;
        };

        match temp.close() {
            Ok(()) => debug!(path = %self.path.display(), "Removed temporary frame"),
            Err(e) => warn!(
                path = %self.path.display(),
                "Failed to remove temporary frame: {}", e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_release_deletes_extracted_frame() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame_a.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let unit = MediaUnit::extracted_frame(&path, 12);
        assert!(unit.is_ephemeral());
        assert_eq!(unit.frame_index(), Some(12));

        unit.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_deletes_extracted_frame() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame_b.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        {
            let _unit = MediaUnit::extracted_frame(&path, 0);
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_release_keeps_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.png");
        std::fs::write(&path, b"png").unwrap();

        let unit = MediaUnit::original(&path);
        assert!(!unit.is_ephemeral());
        assert_eq!(unit.origin(), MediaOrigin::Original);

        unit.release();
        assert!(path.exists());
    }

    #[test]
    fn test_release_of_missing_file_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("already_gone.jpg");

        MediaUnit::extracted_frame(&path, 3).release();
    }
}
