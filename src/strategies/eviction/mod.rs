//! Eviction Strategies
//!
//! Pick the resident entry to sacrifice when the cache is full.

mod fifo;
mod lfu;
mod lru;
mod order;

pub use fifo::FifoEviction;
pub use lfu::LfuEviction;
pub use lru::LruEviction;
pub use order::KeyOrder;

use tracing::debug;

use crate::cache::ExpiringStore;
use crate::observer::Observer;

// == Eviction Strategy ==
pub trait EvictionStrategy: Observer {
    /// Removes at least one entry from a non-empty `cache` and returns the
    /// removed keys.
    ///
    /// Returning an empty list while the cache holds entries means the
    /// strategy cannot make progress; the manager treats it as fatal.
    fn trim_cache(&mut self, cache: &mut ExpiringStore) -> Vec<String>;
}

/// Deletes candidates from `cache` until one was actually resident.
///
/// Candidates can be gone already when they expired after the strategy last
/// heard about them; those are skipped.
pub(crate) fn evict_first_resident<F>(cache: &mut ExpiringStore, mut next_candidate: F) -> Vec<String>
where
    F: FnMut() -> Option<String>,
{
    while let Some(key) = next_candidate() {
        if cache.delete(&key) {
            return vec![key];
        }
        debug!(key = %key, "Eviction candidate no longer resident, skipping");
    }
    Vec::new()
}
