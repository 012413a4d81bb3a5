//! Backing Store Module
//!
//! Capacity-bounded key-value storage. Used both as the cache's value
//! storage and as the origin store the manager falls back to on a miss.

use std::collections::HashMap;

use crate::cache::CacheValue;
use crate::error::OutOfMemory;

/// Point-in-time snapshot of a store's entries.
pub type Items = std::vec::IntoIter<(String, CacheValue)>;

// == Storage ==
/// Key-value store with an optional capacity.
///
/// A store without a capacity is never full.
pub trait Storage: Send {
    /// Returns a copy of the value stored under `key`.
    fn get(&self, key: &str) -> Option<CacheValue>;

    /// Stores `value` under `key`, overwriting any existing value.
    ///
    /// Fails with [`OutOfMemory`] when the store is full and `key` is new.
    fn set(&mut self, key: String, value: CacheValue) -> Result<(), OutOfMemory>;

    /// Removes `key`, returning the value it held.
    fn remove(&mut self, key: &str) -> Option<CacheValue>;

    fn contains(&self, key: &str) -> bool;

    fn size(&self) -> usize;

    fn clear(&mut self);

    /// Snapshot of all entries at the time of the call.
    fn items(&self) -> Items;

    fn capacity(&self) -> Option<usize>;

    /// Removes `key` and reports whether it was present.
    fn delete(&mut self, key: &str) -> bool {
        self.remove(key).is_some()
    }

    /// True when one more new key would not fit.
    fn is_full(&self) -> bool {
        match self.capacity() {
            Some(capacity) => self.size() >= capacity,
            None => false,
        }
    }
}

// == In Memory Storage ==
/// HashMap-backed [`Storage`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    /// Key-value storage
    entries: HashMap<String, CacheValue>,
    /// Maximum number of entries, None = unbounded
    capacity: Option<usize>,
}

impl InMemoryStorage {
    // == Constructor ==
    /// Creates a store holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: Some(capacity),
        }
    }

    /// Creates a store without a size limit.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Creates a store from an optional capacity.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }
}

impl Storage for InMemoryStorage {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: String, value: CacheValue) -> Result<(), OutOfMemory> {
        // Overwrites never need room
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return Ok(());
        }

        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity {
                return Err(OutOfMemory { capacity });
            }
        }

        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Option<CacheValue> {
        self.entries.remove(key)
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn items(&self) -> Items {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
