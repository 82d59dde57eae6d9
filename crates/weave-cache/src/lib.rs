//! Content cache for fetched embed targets.
//!
//! The cache decouples the content loader from the storage mechanism. Entries
//! are keyed by [`CacheKey`] (resolved location plus conversion flag) and carry
//! the time they were fetched so the loader can apply its freshness window.
//!
//! # Partitions
//!
//! Converted (HTML turned into Markdown) and raw content never share a slot:
//! every implementation keeps them in separate partitions.
//!
//! # Generations
//!
//! [`ContentCache::clear`] replaces the whole structure and bumps the
//! generation. A load that started before the clear passes the generation it
//! observed to [`ContentCache::put`], which refuses writes from a superseded
//! generation.
//!
//! # Implementations
//!
//! - [`NullCache`]: No-op implementation (always miss)
//! - [`MemoryCache`]: Process-local map, the default
//! - [`FileCache`]: File-based implementation with version validation
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, SystemTime};
//! use weave_cache::{CacheEntry, CacheKey, ContentCache, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let key = CacheKey::new("https://example.com/page.html", true);
//! cache.put(&key, CacheEntry::now("# Page"), cache.generation());
//!
//! let entry = cache.get(&key).unwrap();
//! assert!(entry.is_fresh(Duration::from_secs(30), SystemTime::now()));
//! ```

mod file;
mod memory;

use std::time::{Duration, SystemTime};

pub use file::FileCache;
pub use memory::MemoryCache;

/// Identifies a cached fetch: where it came from and whether it was converted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Fully resolved location (e.g., `file:///vault/notes/a.md`).
    pub location: String,
    /// Whether the content was converted from HTML to Markdown.
    pub converted: bool,
}

impl CacheKey {
    /// Create a key for `location`.
    #[must_use]
    pub fn new(location: impl Into<String>, converted: bool) -> Self {
        Self {
            location: location.into(),
            converted,
        }
    }

    /// Name of the partition this key belongs to.
    #[must_use]
    pub fn partition(&self) -> &'static str {
        if self.converted { "converted" } else { "raw" }
    }
}

/// A memoized fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Fetched (and possibly converted) content.
    pub content: String,
    /// When the content was fetched.
    pub fetched_at: SystemTime,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn now(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            fetched_at: SystemTime::now(),
        }
    }

    /// Whether the entry is younger than `window` at time `now`.
    ///
    /// An entry stamped in the future (clock skew) counts as age zero, so a
    /// zero window never yields a fresh entry.
    #[must_use]
    pub fn is_fresh(&self, window: Duration, now: SystemTime) -> bool {
        let age = now.duration_since(self.fetched_at).unwrap_or_default();
        age < window
    }
}

/// Keyed store of previously fetched content.
pub trait ContentCache: Send + Sync {
    /// Look up an entry regardless of its age.
    ///
    /// Freshness is the caller's decision (see [`CacheEntry::is_fresh`]).
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Store an entry if `generation` is still current.
    ///
    /// Overwrites any existing entry for the same key. Returns `false` when
    /// the write was dropped because the cache was cleared after the caller
    /// observed `generation`.
    fn put(&self, key: &CacheKey, entry: CacheEntry, generation: u64) -> bool;

    /// Drop every entry by replacing the whole structure.
    fn clear(&self);

    /// Current generation, incremented by every [`clear`](Self::clear).
    fn generation(&self) -> u64;
}

/// No-op [`ContentCache`] that never stores or retrieves data.
///
/// Use when caching is disabled. Every `get` returns `None`; every `put` is
/// silently discarded.
pub struct NullCache;

impl ContentCache for NullCache {
    fn get(&self, _key: &CacheKey) -> Option<CacheEntry> {
        None
    }

    fn put(&self, _key: &CacheKey, _entry: CacheEntry, _generation: u64) -> bool {
        false
    }

    fn clear(&self) {}

    fn generation(&self) -> u64 {
        0
    }
}
