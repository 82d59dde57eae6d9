//! Filesystem adapter trait and error types.
//!
//! Provides the [`FileSystem`] trait through which the embed engine performs
//! every local read, along with [`StorageError`] for unified error handling
//! across backends.
//!
//! # Path Convention
//!
//! All path parameters are **store-relative paths** using `/` separators:
//! - `"index.md"` - document at the store root
//! - `"notes/parent.md"` - nested document
//!
//! The store itself lives at [`FileSystem::base_path`]. Implementations map
//! store-relative paths to their internal storage format.

use std::path::PathBuf;

use async_trait::async_trait;

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid path (e.g., escapes the store).
    InvalidPath,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Whether this error means the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Byte-level access to the document store.
///
/// The embed engine performs no direct OS calls: every local read goes
/// through this trait.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Absolute path of the store root, without a trailing separator.
    fn base_path(&self) -> &str;

    /// Check if a file exists at the given store-relative path.
    ///
    /// Returns `false` on errors (treats errors as "doesn't exist").
    async fn exists(&self, path: &str) -> bool;

    /// Read the raw bytes of a file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist or can't be read.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_storage_error_display_full() {
        let err = StorageError::new(StorageErrorKind::NotFound)
            .with_backend("Fs")
            .with_path("notes/a.md");

        assert_eq!(err.to_string(), "[Fs] Not found (path: notes/a.md)");
    }

    #[test]
    fn test_storage_error_display_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::io(io_err, Some(PathBuf::from("/vault/secret.md")))
            .with_backend("Fs");

        assert_eq!(
            err.to_string(),
            "[Fs] Permission denied: access denied (path: /vault/secret.md)"
        );
    }

    #[test]
    fn test_storage_error_io_mapping() {
        let not_found = StorageError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            None,
        );
        assert!(not_found.is_not_found());

        let timeout = StorageError::io(
            std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"),
            None,
        );
        assert_eq!(timeout.kind, StorageErrorKind::Timeout);

        let other = StorageError::io(std::io::Error::other("boom"), None);
        assert_eq!(other.kind, StorageErrorKind::Other);
    }

    #[test]
    fn test_storage_error_source_chain() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = StorageError::io(io_err, None);
        assert!(err.source().is_some());
        assert!(StorageError::not_found(Path::new("x")).source().is_none());
    }
}
