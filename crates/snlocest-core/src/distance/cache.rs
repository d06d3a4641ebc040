//! Distance Cache
//!
//! Bounded LRU memo of area-pair distances with hit/miss/eviction counters.
//!
//! Thread-safe via interior mutability using parking_lot::Mutex.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use crate::areadata::AreaId;

/// Default capacity (2^19 area pairs)
pub const DEFAULT_CACHE_CAPACITY: usize = 1 << 19;

/// Cache key: an ordered area pair
pub type AreaPair = (AreaId, AreaId);

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compute a distance
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
}

impl CacheMetrics {
    /// Get hit rate as a fraction (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    fn record_hit(&mut self) {
        self.hits += 1;
    }

    fn record_miss(&mut self) {
        self.misses += 1;
    }

    fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

/// Snapshot returned by [`DistanceCache::cache_info`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Inner state (protected by Mutex)
struct CacheState {
    entries: LruCache<AreaPair, f64>,
    metrics: CacheMetrics,
}

/// LRU cache of distances in meters.
///
/// All methods take `&self`.
pub struct DistanceCache {
    capacity: NonZeroUsize,
    state: Mutex<CacheState>,
}

impl std::fmt::Debug for DistanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceCache")
            .field("info", &self.cache_info())
            .finish()
    }
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl DistanceCache {
    /// Create a cache holding at most `capacity` pairs (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            capacity,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                metrics: CacheMetrics::default(),
            }),
        }
    }

    /// Look up a pair, counting the hit or miss
    pub fn get(&self, key: &AreaPair) -> Option<f64> {
        let mut state = self.state.lock();
        match state.entries.get(key).copied() {
            Some(value) => {
                state.metrics.record_hit();
                Some(value)
            }
            None => {
                state.metrics.record_miss();
                None
            }
        }
    }

    /// Store a pair, evicting the least recently used entry when full
    pub fn insert(&self, key: AreaPair, value: f64) {
        let mut state = self.state.lock();
        if let Some((old_key, _)) = state.entries.push(key, value) {
            if old_key != key {
                state.metrics.record_eviction();
            }
        }
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// The lock is not held while `compute` runs.
    pub fn get_or_try_insert_with<F, E>(&self, key: AreaPair, compute: F) -> Result<f64, E>
    where
        F: FnOnce() -> Result<f64, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value);
        Ok(value)
    }

    pub fn cache_info(&self) -> CacheInfo {
        let state = self.state.lock();
        CacheInfo {
            hits: state.metrics.hits,
            misses: state.metrics.misses,
            evictions: state.metrics.evictions,
            len: state.entries.len(),
            capacity: self.capacity.get(),
        }
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.state.lock().metrics.clone()
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.metrics = CacheMetrics::default();
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(a: u64, b: u64) -> AreaPair {
        (AreaId(a), AreaId(b))
    }

    #[test]
    fn test_hit_and_miss_counting() {
        let cache = DistanceCache::new(4);
        assert_eq!(cache.get(&key(1, 2)), None);
        cache.insert(key(1, 2), 10.0);
        assert_eq!(cache.get(&key(1, 2)), Some(10.0));

        let info = cache.cache_info();
        assert_eq!(info.hits, 1);
        assert_eq!(info.misses, 1);
        assert_eq!(info.len, 1);
        assert_eq!(info.capacity, 4);
        assert!((cache.metrics().hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_eviction_is_lru() {
        let cache = DistanceCache::new(2);
        cache.insert(key(1, 1), 1.0);
        cache.insert(key(2, 2), 2.0);
        // Touch (1,1) so (2,2) becomes least recently used
        assert!(cache.get(&key(1, 1)).is_some());
        cache.insert(key(3, 3), 3.0);

        assert_eq!(cache.get(&key(2, 2)), None);
        assert_eq!(cache.get(&key(1, 1)), Some(1.0));
        assert_eq!(cache.cache_info().evictions, 1);
        assert_eq!(cache.cache_info().len, 2);
    }

    #[test]
    fn test_overwrite_is_not_eviction() {
        let cache = DistanceCache::new(2);
        cache.insert(key(1, 1), 1.0);
        cache.insert(key(1, 1), 5.0);
        assert_eq!(cache.cache_info().evictions, 0);
        assert_eq!(cache.get(&key(1, 1)), Some(5.0));
    }

    #[test]
    fn test_get_or_try_insert_with() {
        let cache = DistanceCache::new(8);
        let mut calls = 0;
        for _ in 0..3 {
            let v: Result<f64, ()> = cache.get_or_try_insert_with(key(1, 2), || {
                calls += 1;
                Ok(42.0)
            });
            assert_eq!(v, Ok(42.0));
        }
        assert_eq!(calls, 1);

        let err: Result<f64, &str> = cache.get_or_try_insert_with(key(9, 9), || Err("boom"));
        assert_eq!(err, Err("boom"));
        assert_eq!(cache.get(&key(9, 9)), None);
    }

    #[test]
    fn test_clear_resets_entries_and_metrics() {
        let cache = DistanceCache::new(8);
        cache.insert(key(1, 2), 1.0);
        let _ = cache.get(&key(1, 2));
        cache.clear();
        let info = cache.cache_info();
        assert_eq!((info.hits, info.misses, info.evictions, info.len), (0, 0, 0, 0));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(DistanceCache::new(0).capacity(), 1);
    }
}
