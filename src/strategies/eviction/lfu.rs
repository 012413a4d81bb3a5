//! LFU Eviction
//!
//! Evicts the entry with the fewest hits; ties go to the oldest insertion.
//!
//! Ranks are `(frequency, insertion_seq)` kept in a `BTreeMap`, so the
//! victim is always the first entry and a hit is one remove plus one insert.

use std::collections::{BTreeMap, HashMap};

use crate::cache::ExpiringStore;
use crate::error::ObserverError;
use crate::observer::{EventKind, EventKindSet, ObservationEvent, Observer};
use crate::strategies::eviction::{evict_first_resident, EvictionStrategy};

type Rank = (u64, u64);

// == LFU Eviction ==
#[derive(Debug, Default)]
pub struct LfuEviction {
    /// Keys ordered by rank
    by_rank: BTreeMap<Rank, String>,
    /// Current rank per key
    ranks: HashMap<String, Rank>,
    next_seq: u64,
}

impl LfuEviction {
    const OBSERVATIONS: EventKindSet = EventKindSet::of(&[
        EventKind::Hit,
        EventKind::Write,
        EventKind::Invalidate,
        EventKind::Expiration,
    ]);

    pub fn new() -> Self {
        Self::default()
    }

    /// Hit count recorded for `key`.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.ranks.get(key).map(|(freq, _)| *freq)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    fn insert(&mut self, key: &str) {
        if self.ranks.contains_key(key) {
            return;
        }
        let rank = (0, self.next_seq);
        self.next_seq += 1;
        self.by_rank.insert(rank, key.to_string());
        self.ranks.insert(key.to_string(), rank);
    }

    fn increment(&mut self, key: &str) -> bool {
        let Some(rank) = self.ranks.get_mut(key) else {
            return false;
        };
        let old = *rank;
        rank.0 += 1;
        let new = *rank;

        if let Some(key) = self.by_rank.remove(&old) {
            self.by_rank.insert(new, key);
        }
        true
    }

    fn remove(&mut self, key: &str) {
        if let Some(rank) = self.ranks.remove(key) {
            self.by_rank.remove(&rank);
        }
    }

    fn pop_least_frequent(&mut self) -> Option<String> {
        let (_, key) = self.by_rank.pop_first()?;
        self.ranks.remove(&key);
        Some(key)
    }
}

impl Observer for LfuEviction {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn supported_observations(&self) -> EventKindSet {
        Self::OBSERVATIONS
    }

    fn observe(&mut self, event: &ObservationEvent) -> Result<(), ObserverError> {
        match event.kind {
            EventKind::Write => self.insert(&event.key),
            EventKind::Hit => {
                if !self.increment(&event.key) {
                    return Err(ObserverError::new(
                        "lfu",
                        format!("hit on key {} that was never written", event.key),
                    ));
                }
            }
            EventKind::Invalidate | EventKind::Expiration => self.remove(&event.key),
            _ => {}
        }
        Ok(())
    }
}

impl EvictionStrategy for LfuEviction {
    fn trim_cache(&mut self, cache: &mut ExpiringStore) -> Vec<String> {
        evict_first_resident(cache, || self.pop_least_frequent())
    }
}
