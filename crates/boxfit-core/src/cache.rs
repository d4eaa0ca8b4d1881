//! Shared caches for state that outlives a single render job
//!
//! A [`SharedCache`] has three shapes:
//! - unbounded: everything stays until [`SharedCache::clear`]
//! - bounded: least-recently-used entries go first once full
//! - disabled (capacity 0): nothing is stored, every lookup misses
//!
//! Values are handed out as `Arc<V>`, so a reader never sees a half-built
//! entry. When two threads race to insert the same key the first one
//! wins and both get the stored value back.

use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

enum Store<K: Hash + Eq, V> {
    Unbounded(HashMap<K, Arc<V>>),
    Lru(LruCache<K, Arc<V>>),
    Disabled,
}

/// Thread-safe cache with optional LRU capacity
pub struct SharedCache<K: Hash + Eq, V> {
    store: Mutex<Store<K, V>>,
    capacity: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K: Hash + Eq + Clone, V> SharedCache<K, V> {
    /// Keep every entry
    pub fn unbounded() -> Self {
        Self::with_store(Store::Unbounded(HashMap::new()), None)
    }

    /// Keep at most `capacity` entries; 0 disables storage entirely
    pub fn bounded(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(cap) => Self::with_store(Store::Lru(LruCache::new(cap)), Some(capacity)),
            None => Self::with_store(Store::Disabled, Some(0)),
        }
    }

    /// `None` is unbounded, `Some(n)` is [`SharedCache::bounded`]
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(n) => Self::bounded(n),
            None => Self::unbounded(),
        }
    }

    fn with_store(store: Store<K, V>, capacity: Option<usize>) -> Self {
        Self {
            store: Mutex::new(store),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let found = match &mut *self.store.lock() {
            Store::Unbounded(map) => map.get(key).cloned(),
            Store::Lru(lru) => lru.get(key).cloned(),
            Store::Disabled => None,
        };
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store `value` unless the key is already present; returns the
    /// entry that ends up in the cache
    pub fn insert(&self, key: K, value: Arc<V>) -> Arc<V> {
        match &mut *self.store.lock() {
            Store::Unbounded(map) => map.entry(key).or_insert(value).clone(),
            Store::Lru(lru) => {
                if let Some(existing) = lru.get(&key) {
                    return existing.clone();
                }
                if let Some((_evicted, _)) = lru.push(key, value.clone()) {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    log::trace!("cache full, evicted least recently used entry");
                }
                value
            },
            Store::Disabled => value,
        }
    }

    /// Look up `key`, building and inserting the value on a miss
    ///
    /// `build` runs without the lock held, so two threads may both build
    /// the same entry; only the first insert is kept.
    pub fn get_or_insert_with<F>(&self, key: K, build: F) -> Option<Arc<V>>
    where
        F: FnOnce() -> Option<V>,
    {
        if let Some(hit) = self.get(&key) {
            return Some(hit);
        }
        let value = Arc::new(build()?);
        Some(self.insert(key, value))
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        match &mut *self.store.lock() {
            Store::Unbounded(map) => map.remove(key),
            Store::Lru(lru) => lru.pop(key),
            Store::Disabled => None,
        }
    }

    pub fn len(&self) -> usize {
        match &*self.store.lock() {
            Store::Unbounded(map) => map.len(),
            Store::Lru(lru) => lru.len(),
            Store::Disabled => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match &mut *self.store.lock() {
            Store::Unbounded(map) => map.clear(),
            Store::Lru(lru) => lru.clear(),
            Store::Disabled => {},
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size: self.len(),
            capacity: self.capacity,
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

/// Cache statistics snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    /// `None` for unbounded caches
    pub capacity: Option<usize>,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}
