//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading store files from the local filesystem
//! through `tokio::fs`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::storage::{FileSystem, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage rooted at a directory.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use weave_storage::{FileSystem, FsStorage};
///
/// let storage = FsStorage::new(PathBuf::from("/home/me/notes"));
/// let bytes = storage.read("daily/today.md").await?;
/// ```
#[derive(Debug)]
pub struct FsStorage {
    /// Root directory of the store.
    root: PathBuf,
    /// `root` rendered as a string with `/` separators.
    base: String,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at `root`.
    ///
    /// Trailing separators are dropped so that `base_path` joins cleanly.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        let mut base = root.to_string_lossy().replace('\\', "/");
        while base.len() > 1 && base.ends_with('/') {
            base.pop();
        }
        Self { root, base }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate that a path doesn't escape the store.
    ///
    /// Rejects paths containing parent directory components (`..`) and
    /// absolute paths.
    fn validate_path(path: &Path) -> Result<(), StorageError> {
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));

        if escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(path)
                .with_backend(BACKEND));
        }
        Ok(())
    }
}

#[async_trait]
impl FileSystem for FsStorage {
    fn base_path(&self) -> &str {
        &self.base
    }

    async fn exists(&self, path: &str) -> bool {
        let path = Path::new(path);
        if Self::validate_path(path).is_err() {
            return false;
        }
        tokio::fs::try_exists(self.root.join(path))
            .await
            .unwrap_or(false)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let path = Path::new(path);
        Self::validate_path(path)?;
        let full_path = self.root.join(path);
        tokio::fs::read(&full_path)
            .await
            .map_err(|e| StorageError::io(e, Some(full_path.clone())).with_backend(BACKEND))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn create_test_storage() -> (TempDir, FsStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());
        (temp_dir, storage)
    }

    #[tokio::test]
    async fn test_read_existing_file() {
        let (temp_dir, storage) = create_test_storage();
        fs::create_dir_all(temp_dir.path().join("notes")).unwrap();
        fs::write(temp_dir.path().join("notes/a.md"), "# A\n\nBody.").unwrap();

        let bytes = storage.read("notes/a.md").await.unwrap();

        assert_eq!(String::from_utf8(bytes).unwrap(), "# A\n\nBody.");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let (_temp_dir, storage) = create_test_storage();

        let err = storage.read("missing.md").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Fs"));
    }

    #[tokio::test]
    async fn test_exists() {
        let (temp_dir, storage) = create_test_storage();
        fs::write(temp_dir.path().join("index.md"), "x").unwrap();

        assert!(storage.exists("index.md").await);
        assert!(!storage.exists("other.md").await);
    }

    #[tokio::test]
    async fn test_rejects_paths_escaping_store() {
        let (_temp_dir, storage) = create_test_storage();

        let err = storage.read("../etc/passwd").await.unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
        assert!(!storage.exists("../etc/passwd").await);
        assert!(!storage.exists("/etc/passwd").await);
    }

    #[test]
    fn test_base_path_drops_trailing_separator() {
        let storage = FsStorage::new(PathBuf::from("/home/me/notes/"));
        assert_eq!(storage.base_path(), "/home/me/notes");
        assert_eq!(storage.root(), Path::new("/home/me/notes/"));
    }
}
