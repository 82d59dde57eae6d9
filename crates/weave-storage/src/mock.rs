//! Mock adapters for testing.
//!
//! Provides [`MockStorage`] and [`MockTransport`] for unit testing without
//! filesystem or network access. Both count the I/O they serve so tests can
//! assert that a cached load performed none.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::storage::{FileSystem, StorageError, StorageErrorKind};
use crate::transport::{Transport, TransportError};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores file contents in memory. Use the builder methods to configure the
/// mock with test data and [`set_file`](Self::set_file) to change content
/// between loads.
///
/// # Example
///
/// ```ignore
/// use weave_storage::{FileSystem, MockStorage};
///
/// let storage = MockStorage::new("/vault").with_file("notes.md", "Hello World");
/// let bytes = storage.read("notes.md").await?;
/// assert_eq!(storage.read_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockStorage {
    base: String,
    files: RwLock<HashMap<String, Vec<u8>>>,
    unreadable: RwLock<HashSet<String>>,
    reads: AtomicUsize,
}

impl MockStorage {
    /// Create an empty mock store rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            files: RwLock::new(HashMap::new()),
            unreadable: RwLock::new(HashSet::new()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Add a file with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.set_file(path, content);
        self
    }

    /// Add a file that exists but fails to read.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_unreadable(self, path: impl Into<String>) -> Self {
        self.unreadable.write().unwrap().insert(path.into());
        self
    }

    /// Insert or replace a file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_file(&self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), content.into());
    }

    /// Number of `read` calls served so far, including failed ones.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSystem for MockStorage {
    fn base_path(&self) -> &str {
        &self.base
    }

    async fn exists(&self, path: &str) -> bool {
        self.files.read().unwrap().contains_key(path)
            || self.unreadable.read().unwrap().contains(path)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unreadable.read().unwrap().contains(path) {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_path(path)
                .with_backend(BACKEND));
        }
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path).with_backend(BACKEND))
    }
}

/// Mock network transport for testing.
///
/// Unknown URLs answer with HTTP 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: RwLock<HashMap<String, Result<String, u16>>>,
    requests: RwLock<Vec<String>>,
}

impl MockTransport {
    /// Create a transport with no configured responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `body`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_response(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), Ok(body.into()));
        self
    }

    /// Answer `url` with an error status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), Err(status));
        self
    }

    /// Number of requests performed so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, url: &str) -> Result<String, TransportError> {
        self.requests.write().unwrap().push(url.to_owned());
        match self.responses.read().unwrap().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(TransportError::Status {
                status: *status,
                url: url.to_owned(),
            }),
            None => Err(TransportError::Status {
                status: 404,
                url: url.to_owned(),
            }),
        }
    }
}
