//! FIFO Eviction
//!
//! Evicts in insertion order; hits do not reorder.

use crate::cache::ExpiringStore;
use crate::error::ObserverError;
use crate::observer::{EventKind, EventKindSet, ObservationEvent, Observer};
use crate::strategies::eviction::{evict_first_resident, EvictionStrategy, KeyOrder};

// == FIFO Eviction ==
#[derive(Debug, Default)]
pub struct FifoEviction {
    order: KeyOrder,
}

impl FifoEviction {
    const OBSERVATIONS: EventKindSet = EventKindSet::of(&[
        EventKind::Write,
        EventKind::Invalidate,
        EventKind::Expiration,
    ]);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Observer for FifoEviction {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn supported_observations(&self) -> EventKindSet {
        Self::OBSERVATIONS
    }

    fn observe(&mut self, event: &ObservationEvent) -> Result<(), ObserverError> {
        match event.kind {
            // A rewrite of a resident key keeps its original slot
            EventKind::Write => self.order.insert(&event.key),
            EventKind::Invalidate | EventKind::Expiration => {
                self.order.remove(&event.key);
            }
            _ => {}
        }
        Ok(())
    }
}

impl EvictionStrategy for FifoEviction {
    fn trim_cache(&mut self, cache: &mut ExpiringStore) -> Vec<String> {
        evict_first_resident(cache, || self.order.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::eviction::test_support::{store, write};

    #[test]
    fn test_evicts_in_insertion_order_despite_hits() {
        let (mut cache, _) = store(3);
        let mut fifo = FifoEviction::new();

        write(&mut cache, &mut fifo, "a");
        write(&mut cache, &mut fifo, "b");
        write(&mut cache, &mut fifo, "c");

        // Not subscribed, and would not reorder anyway
        assert!(!fifo.supported_observations().contains(EventKind::Hit));
        fifo.observe(&ObservationEvent::hit("a")).unwrap();

        assert_eq!(fifo.trim_cache(&mut cache), vec!["a".to_string()]);
        assert_eq!(fifo.trim_cache(&mut cache), vec!["b".to_string()]);
        assert_eq!(fifo.trim_cache(&mut cache), vec!["c".to_string()]);
        assert!(fifo.trim_cache(&mut cache).is_empty());
    }

    #[test]
    fn test_reinsert_after_invalidate_goes_to_back() {
        let (mut cache, _) = store(3);
        let mut fifo = FifoEviction::new();

        write(&mut cache, &mut fifo, "a");
        write(&mut cache, &mut fifo, "b");
        cache.delete("a");
        fifo.observe(&ObservationEvent::invalidate("a")).unwrap();
        write(&mut cache, &mut fifo, "a");

        assert_eq!(fifo.trim_cache(&mut cache), vec!["b".to_string()]);
    }

    #[test]
    fn test_expiration_forgets_key() {
        let (mut cache, _) = store(3);
        let mut fifo = FifoEviction::new();

        write(&mut cache, &mut fifo, "a");
        fifo.observe(&ObservationEvent::expiration("a", serde_json::json!("a"), 0))
            .unwrap();

        assert!(fifo.is_empty());
    }
}
