//! LRU Eviction
//!
//! Evicts the entry touched least recently by a hit or a write.

use crate::cache::ExpiringStore;
use crate::error::ObserverError;
use crate::observer::{EventKind, EventKindSet, ObservationEvent, Observer};
use crate::strategies::eviction::{evict_first_resident, EvictionStrategy, KeyOrder};

// == LRU Eviction ==
#[derive(Debug, Default)]
pub struct LruEviction {
    order: KeyOrder,
}

impl LruEviction {
    const OBSERVATIONS: EventKindSet = EventKindSet::of(&[
        EventKind::Hit,
        EventKind::Write,
        EventKind::Invalidate,
        EventKind::Expiration,
    ]);

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys the strategy is tracking.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The key that would be evicted next.
    pub fn peek_victim(&self) -> Option<&String> {
        self.order.peek_front()
    }
}

impl Observer for LruEviction {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn supported_observations(&self) -> EventKindSet {
        Self::OBSERVATIONS
    }

    fn observe(&mut self, event: &ObservationEvent) -> Result<(), ObserverError> {
        match event.kind {
            EventKind::Hit | EventKind::Write => self.order.touch(&event.key),
            EventKind::Invalidate | EventKind::Expiration => {
                self.order.remove(&event.key);
            }
            EventKind::Miss | EventKind::EvictionPolicy => {}
        }
        Ok(())
    }
}

impl EvictionStrategy for LruEviction {
    fn trim_cache(&mut self, cache: &mut ExpiringStore) -> Vec<String> {
        evict_first_resident(cache, || self.order.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::eviction::test_support::{store, write};
    use std::time::Duration;

    #[test]
    fn test_evicts_least_recently_written() {
        let (mut cache, _) = store(3);
        let mut lru = LruEviction::new();

        write(&mut cache, &mut lru, "key1");
        write(&mut cache, &mut lru, "key2");
        write(&mut cache, &mut lru, "key3");

        assert_eq!(lru.trim_cache(&mut cache), vec!["key1".to_string()]);
        assert!(!cache.contains("key1"));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_hit_protects_entry() {
        let (mut cache, _) = store(3);
        let mut lru = LruEviction::new();

        write(&mut cache, &mut lru, "a");
        write(&mut cache, &mut lru, "b");
        lru.observe(&ObservationEvent::hit("a")).unwrap();

        assert_eq!(lru.peek_victim(), Some(&"b".to_string()));
        assert_eq!(lru.trim_cache(&mut cache), vec!["b".to_string()]);
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_invalidate_forgets_key() {
        let (mut cache, _) = store(3);
        let mut lru = LruEviction::new();

        write(&mut cache, &mut lru, "a");
        cache.delete("a");
        lru.observe(&ObservationEvent::invalidate("a")).unwrap();

        assert!(lru.is_empty());
        assert!(lru.trim_cache(&mut cache).is_empty());
    }

    #[test]
    fn test_skips_victims_that_already_expired() {
        let (mut cache, clock) = store(3);
        let mut lru = LruEviction::new();

        write(&mut cache, &mut lru, "a");
        clock.advance(Duration::from_secs(50));
        write(&mut cache, &mut lru, "b");

        // "a" expires, but the strategy has not been told yet
        clock.advance(Duration::from_secs(60));
        assert_eq!(lru.trim_cache(&mut cache), vec!["b".to_string()]);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_empty_cache_yields_no_victims() {
        let (mut cache, _) = store(0);
        let mut lru = LruEviction::new();
        assert!(lru.trim_cache(&mut cache).is_empty());
    }
}
