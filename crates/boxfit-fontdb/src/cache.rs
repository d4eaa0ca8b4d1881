//! Concurrent store of loaded faces and sized handles
//!
//! Two maps share one object: faces keyed by source fingerprint, so every
//! size of a face reuses the same bytes, and handles keyed by [`FontKey`].
//! Inserts are first-writer-wins, so racing jobs agree on one `Arc`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::resolver::{FontHandle, FontKey};
use crate::Font;

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontCacheStats {
    /// Sized handles currently cached
    pub handles: usize,
    /// Distinct faces currently loaded
    pub faces: usize,
    /// Handle limit, if any
    pub capacity: Option<usize>,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Faces and handles shared across jobs
pub struct FontCache {
    handles: DashMap<FontKey, Arc<FontHandle>>,
    faces: DashMap<u64, Arc<Font>>,
    failed: DashMap<u64, String>,
    order: Mutex<VecDeque<FontKey>>,
    capacity: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl FontCache {
    /// No limit on handles
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Keep at most `capacity` handles, dropping the oldest inserted first
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Some(capacity.max(1)))
    }

    fn build(capacity: Option<usize>) -> Self {
        Self {
            handles: DashMap::new(),
            faces: DashMap::new(),
            failed: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &FontKey) -> Option<Arc<FontHandle>> {
        match self.handles.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            },
        }
    }

    /// Store `handle` unless another thread got there first; returns the
    /// handle that ended up in the cache
    pub fn insert(&self, key: FontKey, handle: Arc<FontHandle>) -> Arc<FontHandle> {
        let mut fresh = false;
        let stored = Arc::clone(
            self.handles
                .entry(key)
                .or_insert_with(|| {
                    fresh = true;
                    handle
                })
                .value(),
        );
        if fresh {
            self.track(key);
        }
        stored
    }

    fn track(&self, key: FontKey) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let mut order = self.order.lock();
        order.push_back(key);
        while order.len() > capacity {
            let Some(oldest) = order.pop_front() else {
                break;
            };
            if self.handles.remove(&oldest).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                log::trace!("Evicted font handle {:?}", oldest);
            }
        }
    }

    pub fn face(&self, fingerprint: u64) -> Option<Arc<Font>> {
        self.faces.get(&fingerprint).map(|f| Arc::clone(f.value()))
    }

    pub fn insert_face(&self, fingerprint: u64, font: Font) -> Arc<Font> {
        Arc::clone(
            self.faces
                .entry(fingerprint)
                .or_insert_with(|| Arc::new(font))
                .value(),
        )
    }

    /// Remember that a source could not be parsed so later lookups skip it
    pub fn mark_failed(&self, fingerprint: u64, label: String) {
        self.failed.insert(fingerprint, label);
    }

    pub fn has_failed(&self, fingerprint: u64) -> bool {
        self.failed.contains_key(&fingerprint)
    }

    /// Drop everything loaded from the source labelled `label`
    pub fn invalidate(&self, label: &str) {
        self.handles.retain(|_, h| h.font().name() != label);
        self.faces.retain(|_, f| f.name() != label);
        self.failed.retain(|_, name| name != label);
        self.order.lock().retain(|k| self.handles.contains_key(k));
    }

    pub fn clear(&self) {
        self.handles.clear();
        self.faces.clear();
        self.failed.clear();
        self.order.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn stats(&self) -> FontCacheStats {
        FontCacheStats {
            handles: self.handles.len(),
            faces: self.faces.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache").field("stats", &self.stats()).finish()
    }
}
