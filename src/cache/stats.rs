//! Cache Statistics Module
//!
//! Running counters owned by the cache manager.

use serde::Serialize;

// == Cache Statistics ==
/// Tracks cache performance and policy decisions.
///
/// Only the manager mutates these; callers get snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    /// Reads served from the cache
    pub hits: u64,
    /// Reads that fell through to the origin store
    pub misses: u64,
    /// Cached entries dropped by a write or delete
    pub invalidations: u64,
    /// Entries removed by the eviction strategy to make room
    pub manual_evicts: u64,
    /// Entries removed by TTL expiry
    pub expirations: u64,
    /// Admission decisions that allowed caching
    pub should_cache_true: u64,
    /// Admission decisions that refused caching
    pub should_cache_false: u64,
    /// Entries currently in the cache
    pub cache_size: usize,
    /// Configured cache capacity, None = unbounded
    pub capacity: Option<usize>,
}

impl CacheStatistics {
    // == Constructor ==
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    pub fn record_manual_evict(&mut self) {
        self.manual_evicts += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    /// Counts one admission decision.
    pub fn record_admission(&mut self, admitted: bool) {
        if admitted {
            self.should_cache_true += 1;
        } else {
            self.should_cache_false += 1;
        }
    }

    pub fn set_cache_size(&mut self, count: usize) {
        self.cache_size = count;
    }
}
