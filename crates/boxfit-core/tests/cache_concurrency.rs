//! Concurrent insert/read behavior of the shared cache.
#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use boxfit_core::cache::SharedCache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn racing_inserts_agree_on_one_value() {
    let cache: Arc<SharedCache<String, Vec<u8>>> = Arc::new(SharedCache::unbounded());
    let builds = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let builds = Arc::clone(&builds);
            thread::spawn(move || {
                cache
                    .get_or_insert_with("😀@32".to_string(), || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Some(vec![t as u8; 16])
                    })
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<Vec<u8>>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Duplicate work is allowed, disagreement is not
    assert!(builds.load(Ordering::SeqCst) >= 1);
    let stored = cache.get(&"😀@32".to_string()).unwrap();
    assert!(results.iter().all(|r| **r == *stored));
    assert_eq!(cache.len(), 1);
}

#[test]
fn bounded_cache_stays_within_capacity_under_load() {
    let cache: Arc<SharedCache<u32, u32>> = Arc::new(SharedCache::bounded(16));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..200u32 {
                    let key = t * 1000 + i;
                    cache.insert(key, Arc::new(i));
                    if let Some(v) = cache.get(&key) {
                        assert_eq!(*v, i);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert!(cache.len() <= 16);
    assert!(cache.stats().evictions >= 800 - 16);
}
