//! File-based cache implementation.
//!
//! [`FileCache`] stores cache entries as files on disk, one directory per
//! partition. Each entry is a single file named after the SHA-256 of its
//! location, with a fixed header followed by the content:
//!
//! ```text
//! [fetched_at_ms: u64 LE][content bytes]
//! ```
//!
//! On construction, [`FileCache`] validates a `VERSION` file in the cache root.
//! If the version mismatches or is missing, the entire cache directory is wiped
//! and recreated. [`ContentCache::clear`] performs the same wipe.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::{CacheEntry, CacheKey, ContentCache};

/// Size of the entry header in bytes.
const HEADER_LEN: usize = 8;

/// File-based [`ContentCache`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION            # contains the cache version string
/// +-- raw/               # unconverted content
/// |   +-- 3f2a...        # cache entry
/// +-- converted/         # HTML converted to Markdown
///     +-- ...
/// ```
///
/// The generation counter lives in memory only: it guards loads that are in
/// flight in this process while a clear happens.
pub struct FileCache {
    root: PathBuf,
    version: String,
    generation: AtomicU64,
}

impl FileCache {
    /// Create a new file-based cache at `root`, validating the cache version.
    ///
    /// If the `VERSION` file inside `root` does not match `version`, the entire
    /// cache directory is removed and recreated with the new version. Errors
    /// during validation are logged but never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self {
            root,
            version: version.to_owned(),
            generation: AtomicU64::new(0),
        }
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let digest = Sha256::digest(key.location.as_bytes());
        self.root.join(key.partition()).join(hex::encode(digest))
    }
}

impl ContentCache for FileCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let bytes = fs::read(self.entry_path(key)).ok()?;
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let (header, data) = bytes.split_at(HEADER_LEN);
        let millis = u64::from_le_bytes(header.try_into().ok()?);
        let content = String::from_utf8(data.to_vec()).ok()?;

        Some(CacheEntry {
            content,
            fetched_at: UNIX_EPOCH + Duration::from_millis(millis),
        })
    }

    fn put(&self, key: &CacheKey, entry: CacheEntry, generation: u64) -> bool {
        let current = self.generation.load(Ordering::Acquire);
        if current != generation {
            tracing::debug!(
                location = %key.location,
                stale = generation,
                current,
                "Dropping cache write from superseded generation"
            );
            return false;
        }

        let path = self.entry_path(key);

        // Write failures only cost a refetch
        let Some(parent) = path.parent() else {
            return false;
        };
        if fs::create_dir_all(parent).is_err() {
            return false;
        }

        let millis = entry
            .fetched_at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        let mut buf = Vec::with_capacity(HEADER_LEN + entry.content.len());
        buf.extend_from_slice(&millis.to_le_bytes());
        buf.extend_from_slice(entry.content.as_bytes());

        fs::write(&path, &buf).is_ok()
    }

    fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        wipe(&self.root, &self.version);
        tracing::info!(root = %self.root.display(), "Content cache cleared");
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                "cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no cache VERSION file found, initializing cache");
        }
    }

    wipe(root, version);
}

/// Remove the cache directory and recreate it with a `VERSION` file.
fn wipe(root: &Path, version: &str) {
    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(root.join("VERSION"), version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}

/// Current time truncated to millisecond precision, as stored on disk.
#[cfg(test)]
fn now_millis() -> SystemTime {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    UNIX_EPOCH + Duration::from_millis(u64::try_from(millis).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entry(content: &str) -> CacheEntry {
        CacheEntry {
            content: content.to_owned(),
            fetched_at: now_millis(),
        }
    }

    #[test]
    fn test_put_and_get() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("cache"), "v1");
        let key = CacheKey::new("file:///vault/notes/a.md", false);
        let stored = entry("# Notes");

        assert!(cache.put(&key, stored.clone(), 0));
        assert_eq!(cache.get(&key), Some(stored));
    }

    #[test]
    fn test_get_nonexistent_key() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("cache"), "v1");
        assert_eq!(cache.get(&CacheKey::new("missing", false)), None);
    }

    #[test]
    fn test_partitions_use_separate_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        let cache = FileCache::new(root.clone(), "v1");

        cache.put(&CacheKey::new("https://x/p.html", false), entry("<p>x</p>"), 0);
        cache.put(&CacheKey::new("https://x/p.html", true), entry("x"), 0);

        assert_eq!(fs::read_dir(root.join("raw")).unwrap().count(), 1);
        assert_eq!(fs::read_dir(root.join("converted")).unwrap().count(), 1);
        assert_eq!(
            cache
                .get(&CacheKey::new("https://x/p.html", true))
                .unwrap()
                .content,
            "x"
        );
    }

    #[test]
    fn test_clear_wipes_entries_and_bumps_generation() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        let cache = FileCache::new(root.clone(), "v1");
        let key = CacheKey::new("a", false);
        cache.put(&key, entry("data"), 0);

        cache.clear();

        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.generation(), 1);
        assert!(!cache.put(&key, entry("late"), 0));
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v1");
    }

    #[test]
    fn test_truncated_entry_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("cache"), "v1");
        let key = CacheKey::new("a", false);
        let path = cache.entry_path(&key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"abc").unwrap();

        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_version_match_keeps_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        let key = CacheKey::new("a", false);

        FileCache::new(root.clone(), "v1").put(&key, entry("preserved"), 0);

        let reopened = FileCache::new(root, "v1");
        assert_eq!(reopened.get(&key).unwrap().content, "preserved");
    }

    #[test]
    fn test_version_mismatch_wipes_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        let key = CacheKey::new("a", false);

        FileCache::new(root.clone(), "v1").put(&key, entry("will-be-wiped"), 0);

        let reopened = FileCache::new(root.clone(), "v2");
        assert_eq!(reopened.get(&key), None);
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v2");
    }

    #[test]
    fn test_nonexistent_root_creates_version() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deeply/nested/cache");
        assert!(!root.exists());

        let _cache = FileCache::new(root.clone(), "v1");

        assert!(root.exists());
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v1");
    }
}
