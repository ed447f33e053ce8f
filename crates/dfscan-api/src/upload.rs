//! Multipart upload handling.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use dfscan_media::{media_kind, MediaKind};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Multipart field carrying the media.
pub const FILE_FIELD: &str = "file";

/// An uploaded file on disk, deleted when removed or dropped.
#[derive(Debug)]
pub struct UploadedFile {
    original_name: String,
    path: TempPath,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn remove(self) {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => debug!(path = %path.display(), "Removed upload"),
            Err(e) => warn!(path = %path.display(), "Failed to remove upload: {}", e),
        }
    }
}

/// Whether `filename` has an extension we can analyze.
pub fn allowed_file(filename: &str) -> bool {
    media_kind(filename) != MediaKind::Unsupported
}

/// Reduce a client-supplied name to a safe final path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stream the `file` field of `multipart` into `upload_dir`.
pub async fn save_upload(upload_dir: &Path, multipart: &mut Multipart) -> ApiResult<UploadedFile> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        if original_name.is_empty() {
            return Err(ApiError::bad_request("No selected file"));
        }
        if !allowed_file(&original_name) {
            return Err(ApiError::bad_request("File type not allowed"));
        }

        tokio::fs::create_dir_all(upload_dir).await?;
        let path: PathBuf = upload_dir.join(format!(
            "{}_{}",
            Uuid::new_v4(),
            sanitize_filename(&original_name)
        ));

        let mut file = tokio::fs::File::create(&path).await?;
        // Partial uploads are removed on any early return from here on
        let path = TempPath::from_path(path);

        let mut written = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::bad_request(format!("Upload interrupted: {}", e)))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        debug!(
            name = %original_name,
            path = %path.display(),
            bytes = written,
            "Saved upload"
        );

        return Ok(UploadedFile {
            original_name,
            path,
        });
    }

    Err(ApiError::bad_request("No file part"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("face.PNG"));
        assert!(allowed_file("clip.mov"));
        assert!(!allowed_file("archive.zip"));
        assert!(!allowed_file("noextension"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my face.jpg"), "my_face.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd.png"), "passwd.png");
        assert_eq!(sanitize_filename("C:\\Users\\me\\clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename(".hidden.jpg"), "hidden.jpg");
        assert_eq!(sanitize_filename("..."), "upload");
    }
}
