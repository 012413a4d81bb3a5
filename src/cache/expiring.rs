//! Expiring Store Module
//!
//! Wraps a [`Storage`] with a time index so entries leave after their TTL.
//!
//! Expiration is lazy: every call that reads or mutates the store first
//! sweeps the index, popping records whose eviction time has passed. The
//! index is a min-heap ordered by eviction time. Records are never removed
//! from the middle of the heap; instead each record carries a generation and
//! only the generation stored in the `live` map for its key is valid. A
//! re-`set` or `delete` bumps or drops that generation, and the stale record
//! is discarded when it reaches the top.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::cache::clock::{duration_ms, SharedClock};
use crate::cache::storage::{Items, Storage};
use crate::cache::CacheValue;
use crate::error::OutOfMemory;
use crate::observer::ObservationEvent;

/// Callback invoked once per expired key.
pub type ExpirationListener = Box<dyn FnMut(&ObservationEvent) + Send>;

/// Heap records below this count are never compacted.
const COMPACTION_FLOOR: usize = 64;

// == Expiration Record ==
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExpirationRecord {
    eviction_time: u64,
    generation: u64,
    key: String,
}

impl Ord for ExpirationRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.eviction_time
            .cmp(&other.eviction_time)
            .then(self.generation.cmp(&other.generation))
    }
}

impl PartialOrd for ExpirationRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy)]
struct LiveRecord {
    generation: u64,
    eviction_time: u64,
}

// == Expiring Store ==
/// Storage with per-key TTL and an expiration notification channel.
pub struct ExpiringStore {
    /// Value storage
    memory: Box<dyn Storage>,
    /// Min-heap of expiration records, may hold stale generations
    heap: BinaryHeap<Reverse<ExpirationRecord>>,
    /// Current generation and eviction time per key
    live: HashMap<String, LiveRecord>,
    next_generation: u64,
    clock: SharedClock,
    listeners: Vec<ExpirationListener>,
}

impl ExpiringStore {
    // == Constructor ==
    pub fn new(memory: Box<dyn Storage>, clock: SharedClock) -> Self {
        Self {
            memory,
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_generation: 0,
            clock,
            listeners: Vec::new(),
        }
    }

    /// Registers a callback for every expiration the sweep discovers.
    pub fn register_expiration_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&ObservationEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    // == Expire ==
    /// Removes every entry whose eviction time is at or before now.
    ///
    /// Returns the number of entries removed. Stale records are dropped
    /// without notification.
    pub fn expire(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;

        while let Some(Reverse(top)) = self.heap.peek() {
            if top.eviction_time > now {
                break;
            }
            let Some(Reverse(record)) = self.heap.pop() else {
                break;
            };

            if !self.is_live(&record) {
                continue;
            }
            self.live.remove(&record.key);

            if let Some(value) = self.memory.remove(&record.key) {
                removed += 1;
                let event = ObservationEvent::expiration(record.key, value, record.eviction_time);
                for listener in self.listeners.iter_mut() {
                    listener(&event);
                }
            }
        }

        if removed > 0 {
            debug!(removed, "Expired entries swept");
        }
        removed
    }

    // == Get ==
    pub fn get(&mut self, key: &str) -> Option<CacheValue> {
        self.expire();
        self.memory.get(key)
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`.
    ///
    /// Overwriting a key replaces its expiration; only the newest record
    /// can ever fire.
    pub fn set(&mut self, key: String, value: CacheValue, ttl: Duration) -> Result<(), OutOfMemory> {
        self.expire();
        self.memory.set(key.clone(), value)?;

        let eviction_time = self.clock.now_ms().saturating_add(duration_ms(ttl));
        let generation = self.next_generation;
        self.next_generation += 1;

        self.live.insert(
            key.clone(),
            LiveRecord {
                generation,
                eviction_time,
            },
        );
        self.heap.push(Reverse(ExpirationRecord {
            eviction_time,
            generation,
            key,
        }));

        self.maybe_compact();
        Ok(())
    }

    // == Delete ==
    /// Removes `key`. Returns whether it was present.
    ///
    /// The pending expiration record is tombstoned so a later sweep does not
    /// report an expiration for a key that was removed explicitly.
    pub fn delete(&mut self, key: &str) -> bool {
        self.expire();
        self.live.remove(key);
        let existed = self.memory.delete(key);
        self.maybe_compact();
        existed
    }

    pub fn contains(&mut self, key: &str) -> bool {
        self.expire();
        self.memory.contains(key)
    }

    pub fn size(&mut self) -> usize {
        self.expire();
        self.memory.size()
    }

    pub fn is_full(&mut self) -> bool {
        self.expire();
        self.memory.is_full()
    }

    /// Drops every entry and every pending expiration.
    pub fn clear(&mut self) {
        self.expire();
        self.memory.clear();
        self.heap.clear();
        self.live.clear();
    }

    /// Snapshot of the unexpired entries.
    pub fn items(&mut self) -> Items {
        self.expire();
        self.memory.items()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.memory.capacity()
    }

    /// Time left before `key` expires.
    pub fn ttl_remaining(&mut self, key: &str) -> Option<Duration> {
        self.expire();
        let now = self.clock.now_ms();
        self.live
            .get(key)
            .map(|record| Duration::from_millis(record.eviction_time.saturating_sub(now)))
    }

    // == Compaction ==
    /// Number of records in the time index, including stale ones.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Drops every stale record from the time index.
    pub fn compact(&mut self) {
        let live = &self.live;
        self.heap.retain(|Reverse(record)| {
            live.get(&record.key)
                .is_some_and(|current| current.generation == record.generation)
        });
    }

    fn maybe_compact(&mut self) {
        if self.heap.len() > COMPACTION_FLOOR && self.heap.len() > self.live.len() * 2 {
            let before = self.heap.len();
            self.compact();
            debug!(before, after = self.heap.len(), "Compacted expiration index");
        }
    }

    fn is_live(&self, record: &ExpirationRecord) -> bool {
        self.live
            .get(&record.key)
            .is_some_and(|current| current.generation == record.generation)
    }
}

impl fmt::Debug for ExpiringStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("entries", &self.memory.size())
            .field("capacity", &self.memory.capacity())
            .field("live_records", &self.live.len())
            .field("heap_records", &self.heap.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
