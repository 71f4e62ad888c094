//! CV upload storage.
//!
//! Files land under the configured upload directory with a UUID prefix and
//! are served back read-only at `/uploads/*`; only the relative URL is
//! stored on the owning record.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use workverse_models::CvFile;

use crate::error::{ApiError, ApiResult};
use crate::security::{is_allowed_cv_file, sanitize_file_name};

/// A stored CV: the record to persist plus the on-disk path, kept so a
/// failed follow-up write can clean the file up again.
#[derive(Debug)]
pub struct StoredCv {
    pub cv: CvFile,
    pub path: PathBuf,
}

/// Validate and write an uploaded CV to the upload directory.
pub async fn store_cv(
    upload_dir: &Path,
    original_name: &str,
    bytes: &[u8],
    max_size: usize,
) -> ApiResult<StoredCv> {
    let clean_name = sanitize_file_name(original_name);
    if !is_allowed_cv_file(&clean_name) {
        return Err(ApiError::bad_request(
            "CV must be a .pdf, .doc, or .docx file",
        ));
    }
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded CV is empty"));
    }
    if bytes.len() > max_size {
        return Err(ApiError::PayloadTooLarge(format!(
            "CV exceeds the maximum size of {} bytes",
            max_size
        )));
    }

    let stored_name = format!("{}-{}", Uuid::new_v4(), clean_name);
    let path = upload_dir.join(&stored_name);

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store CV: {e}")))?;

    Ok(StoredCv {
        cv: CvFile {
            file_name: clean_name,
            file_url: format!("/uploads/{stored_name}"),
            file_size: bytes.len() as u64,
        },
        path,
    })
}

/// Best-effort removal of a stored CV, used when the write that should
/// have referenced it fails afterwards.
pub async fn discard_cv(stored: &StoredCv) {
    let _ = tokio::fs::remove_file(&stored.path).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_discard() {
        let dir = tempfile::tempdir().unwrap();

        let stored = store_cv(dir.path(), "my cv.pdf", b"%PDF-1.4", 1024).await.unwrap();
        assert_eq!(stored.cv.file_name, "my cv.pdf");
        assert_eq!(stored.cv.file_size, 8);
        assert!(stored.cv.file_url.starts_with("/uploads/"));
        assert!(stored.path.exists());

        discard_cv(&stored).await;
        assert!(!stored.path.exists());
    }

    #[tokio::test]
    async fn test_rejects_bad_extension_and_oversize() {
        let dir = tempfile::tempdir().unwrap();

        let err = store_cv(dir.path(), "tool.exe", b"MZ", 1024).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = store_cv(dir.path(), "cv.pdf", &[0u8; 32], 16).await.unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge(_)));

        let err = store_cv(dir.path(), "cv.pdf", b"", 16).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
