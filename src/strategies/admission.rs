//! Admission Strategies
//!
//! Decide whether a value offered to the cache is stored at all.

use std::time::Duration;

use crate::cache::CacheValue;
use crate::error::ObserverError;
use crate::observer::{EventKindSet, ObservationEvent, Observer};
use crate::strategies::CacheOp;

// == Admission Strategy ==
pub trait AdmissionStrategy: Observer {
    /// Returns true if `value` should be written to the cache for `ttl`.
    fn should_cache(&mut self, key: &str, value: &CacheValue, ttl: Duration, op: CacheOp) -> bool;
}

// == Always Cache ==
/// Caches on every read miss and every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysCache;

impl Observer for AlwaysCache {
    fn name(&self) -> &'static str {
        "read_write"
    }

    fn supported_observations(&self) -> EventKindSet {
        EventKindSet::EMPTY
    }

    fn observe(&mut self, _event: &ObservationEvent) -> Result<(), ObserverError> {
        Ok(())
    }
}

impl AdmissionStrategy for AlwaysCache {
    fn should_cache(&mut self, _key: &str, _value: &CacheValue, _ttl: Duration, _op: CacheOp) -> bool {
        true
    }
}

// == Cache On Miss Only ==
/// Caches values fetched on a read miss; writes only invalidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheOnMissOnly;

impl Observer for CacheOnMissOnly {
    fn name(&self) -> &'static str {
        "read_only"
    }

    fn supported_observations(&self) -> EventKindSet {
        EventKindSet::EMPTY
    }

    fn observe(&mut self, _event: &ObservationEvent) -> Result<(), ObserverError> {
        Ok(())
    }
}

impl AdmissionStrategy for CacheOnMissOnly {
    fn should_cache(&mut self, _key: &str, _value: &CacheValue, _ttl: Duration, op: CacheOp) -> bool {
        op == CacheOp::Miss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(10);

    #[test]
    fn test_always_cache_admits_everything() {
        let mut strategy = AlwaysCache;
        for op in [CacheOp::New, CacheOp::Update, CacheOp::Miss] {
            assert!(strategy.should_cache("k", &json!(1), TTL, op));
        }
    }

    #[test]
    fn test_cache_on_miss_only() {
        let mut strategy = CacheOnMissOnly;
        assert!(strategy.should_cache("k", &json!(1), TTL, CacheOp::Miss));
        assert!(!strategy.should_cache("k", &json!(1), TTL, CacheOp::New));
        assert!(!strategy.should_cache("k", &json!(1), TTL, CacheOp::Update));
    }

    #[test]
    fn test_stateless_strategies_subscribe_to_nothing() {
        assert!(AlwaysCache.supported_observations().is_empty());
        assert!(CacheOnMissOnly.supported_observations().is_empty());
    }
}
