//! In-memory cache implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{CacheEntry, CacheKey, ContentCache};

/// One generation of cached content, split into raw and converted partitions.
#[derive(Default)]
struct CacheTable {
    generation: u64,
    raw: RwLock<HashMap<String, CacheEntry>>,
    converted: RwLock<HashMap<String, CacheEntry>>,
}

impl CacheTable {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    fn partition(&self, key: &CacheKey) -> &RwLock<HashMap<String, CacheEntry>> {
        if key.converted {
            &self.converted
        } else {
            &self.raw
        }
    }
}

/// Process-local [`ContentCache`].
///
/// Clearing swaps in a fresh table; readers that already hold the previous
/// table keep working against it.
#[derive(Default)]
pub struct MemoryCache {
    table: RwLock<Arc<CacheTable>>,
}

impl MemoryCache {
    /// Create an empty cache at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Arc<CacheTable> {
        Arc::clone(&self.table.read().unwrap())
    }

    /// Number of entries across both partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        let table = self.current();
        let raw = table.raw.read().unwrap().len();
        let converted = table.converted.read().unwrap().len();
        raw + converted
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let table = self.current();
        let partition = table.partition(key).read().unwrap();
        partition.get(&key.location).cloned()
    }

    fn put(&self, key: &CacheKey, entry: CacheEntry, generation: u64) -> bool {
        let table = self.current();
        if table.generation != generation {
            tracing::debug!(
                location = %key.location,
                stale = generation,
                current = table.generation,
                "Dropping cache write from superseded generation"
            );
            return false;
        }
        table
            .partition(key)
            .write()
            .unwrap()
            .insert(key.location.clone(), entry);
        true
    }

    fn clear(&self) {
        let mut table = self.table.write().unwrap();
        let next = table.generation + 1;
        *table = Arc::new(CacheTable::new(next));
        tracing::info!(generation = next, "Content cache cleared");
    }

    fn generation(&self) -> u64 {
        self.current().generation
    }
}
