//! Key Order Module
//!
//! Ordered key index shared by the LRU and FIFO strategies.

use std::collections::{BTreeMap, HashMap};

// == Key Order ==
/// Tracks keys in the order they were last placed at the back.
///
/// Each placement stamps the key with a fresh tick:
/// - Front = smallest tick (oldest)
/// - Back = largest tick (newest)
#[derive(Debug, Default)]
pub struct KeyOrder {
    /// Keys by tick
    order: BTreeMap<u64, String>,
    /// Current tick per key
    ticks: HashMap<String, u64>,
    next_tick: u64,
}

impl KeyOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Moves `key` to the back, inserting it if new.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.push_back(key);
    }

    /// Inserts `key` at the back unless it is already tracked.
    pub fn insert(&mut self, key: &str) {
        if !self.ticks.contains_key(key) {
            self.push_back(key);
        }
    }

    // == Remove ==
    /// Stops tracking `key`. Returns whether it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.ticks.remove(key) {
            Some(tick) => {
                self.order.remove(&tick);
                true
            }
            None => false,
        }
    }

    // == Pop Front ==
    /// Removes and returns the oldest key.
    pub fn pop_front(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// The oldest key, without removing it.
    pub fn peek_front(&self) -> Option<&String> {
        self.order.values().next()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }

    fn push_back(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(tick, key.to_string());
        self.ticks.insert(key.to_string(), tick);
    }
}
