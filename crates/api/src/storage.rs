//! On-disk layout of uploaded files.
//!
//! ```text
//! {upload_root}/{dataset_id}/{file_name}    dataset images
//! {models_root}/{owner_id}/{file_name}      custom model weights
//! ```
//!
//! Database rows store the path relative to its root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use adaptlabel_core::types::DbId;

use crate::error::{AppError, AppResult};

pub fn dataset_dir(upload_root: &Path, dataset_id: DbId) -> PathBuf {
    upload_root.join(dataset_id.to_string())
}

pub fn image_relative_path(dataset_id: DbId, file_name: &str) -> String {
    format!("{dataset_id}/{file_name}")
}

pub fn weights_relative_path(owner_id: DbId, file_name: &str) -> String {
    format!("{owner_id}/{file_name}")
}

/// Write `data` to `path`, creating parent directories.
pub async fn write_file(path: &Path, data: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to create {}: {e}", parent.display())))?;
    }
    tokio::fs::write(path, data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write {}: {e}", path.display())))
}

/// Remove a file. A file that is already gone is not an error; other
/// failures are logged and swallowed since the row is already deleted.
pub async fn remove_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "File removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}

/// Remove a directory tree, with the same policy as [`remove_file`].
pub async fn remove_dir(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Directory removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_remove() {
        let root = tempfile::tempdir().unwrap();
        let path = dataset_dir(root.path(), 7).join("a.jpg");
        write_file(&path, b"img").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"img");

        remove_dir(&dataset_dir(root.path(), 7)).await;
        assert!(!path.exists());
        // Already gone.
        remove_file(&path).await;
    }

    #[test]
    fn relative_paths() {
        assert_eq!(image_relative_path(3, "a.jpg"), "3/a.jpg");
        assert_eq!(weights_relative_path(9, "m.pt"), "9/m.pt");
    }
}
