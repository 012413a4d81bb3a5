//! Cache Manager Module
//!
//! Sequences get/set/delete against the expiring cache, the origin store and
//! the policies, and keeps the running statistics.
//!
//! Expirations discovered by the cache's lazy sweep arrive over a channel
//! and are published through the same dispatcher as the manager's own
//! events, right after the cache call that produced them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error};

use crate::cache::clock::SharedClock;
use crate::cache::storage::{InMemoryStorage, Storage};
use crate::cache::{CacheStatistics, CacheValue, ExpiringStore};
use crate::config::Config;
use crate::error::ConfigError;
use crate::observer::{ObservationEvent, Observer, ObserverDispatch};
use crate::strategies::{CacheOp, Policies, PolicyNames};

/// Default bound on evict-and-retry rounds per admission.
pub const DEFAULT_EVICTION_RETRY_LIMIT: usize = 16;

// == Admit Outcome ==
/// Result of offering a value to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// The admission strategy declined; the value was not cached
    Rejected,
    /// The value was cached after evicting `evicted` entries
    Cached { evicted: usize },
}

// == Admit State ==
/// Steps of the admission pipeline once a value has been accepted.
#[derive(Debug)]
enum AdmitState {
    /// First write attempt
    Admitting,
    /// Cache was full; about to run eviction round `attempt`
    Evicting { attempt: usize },
    /// Write attempt after eviction round `attempt`
    Retrying { attempt: usize },
    Succeeded,
    Failed(ConfigError),
}

// == Cache Manager ==
pub struct CacheManager {
    cache: ExpiringStore,
    /// Origin store consulted on a miss
    backend: Box<dyn Storage>,
    policies: Policies,
    observers: ObserverDispatch,
    stats: CacheStatistics,
    expirations: UnboundedReceiver<ObservationEvent>,
    retry_limit: usize,
}

impl CacheManager {
    // == Constructor ==
    pub fn new(mut cache: ExpiringStore, backend: Box<dyn Storage>, policies: Policies) -> Self {
        let (tx, expirations) = mpsc::unbounded_channel();
        cache.register_expiration_listener(move |event| {
            // Receiver lives as long as the manager that owns this store
            let _ = tx.send(event.clone());
        });

        let observers = ObserverDispatch::new(&policies);
        let stats = CacheStatistics::new(cache.capacity());

        Self {
            cache,
            backend,
            policies,
            observers,
            stats,
            expirations,
            retry_limit: DEFAULT_EVICTION_RETRY_LIMIT,
        }
    }

    /// Builds in-memory cache and origin stores and the configured policies.
    pub fn from_config(config: &Config, clock: SharedClock) -> Self {
        let cache = ExpiringStore::new(
            Box::new(InMemoryStorage::new(config.cache_capacity)),
            Arc::clone(&clock),
        );
        let backend = Box::new(InMemoryStorage::new(config.backend_capacity));
        let policies = Policies::from_config(&config.policies, clock);

        Self::new(cache, backend, policies).with_retry_limit(config.eviction_retry_limit)
    }

    /// Sets the bound on evict-and-retry rounds per admission.
    ///
    /// At least one round is always allowed.
    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.retry_limit = retry_limit.max(1);
        self
    }

    /// Adds an observer that receives events after the policies.
    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.observers.subscribe(observer);
    }

    // == Get ==
    /// Returns the cached value, or falls back to the origin store.
    ///
    /// A value fetched from the origin is offered to the cache as a miss.
    pub fn get(&mut self, key: &str) -> Result<Option<CacheValue>, ConfigError> {
        let cached = self.cache.get(key);
        self.drain_expirations();

        if let Some(value) = cached {
            self.stats.record_hit();
            self.publish(ObservationEvent::hit(key));
            return Ok(Some(value));
        }

        self.stats.record_miss();
        let value = self.backend.get(key);
        self.publish(ObservationEvent::miss(key));

        if let Some(value) = &value {
            self.admit(key, value.clone(), CacheOp::Miss)?;
        }
        Ok(value)
    }

    // == Set ==
    /// Invalidates any cached copy of `key` and offers `value` to the cache.
    ///
    /// The origin store is not written; callers own write-through.
    pub fn set(&mut self, key: &str, value: CacheValue) -> Result<AdmitOutcome, ConfigError> {
        let op = if self.invalidate(key) {
            CacheOp::Update
        } else {
            CacheOp::New
        };
        self.admit(key, value, op)
    }

    // == Delete ==
    /// Drops `key` from the cache. Returns false if it was not cached.
    pub fn delete(&mut self, key: &str) -> bool {
        self.invalidate(key)
    }

    // == Admit ==
    /// Runs admission, TTL estimation and the write, evicting on a full cache.
    ///
    /// Fails when the eviction strategy cannot free room: it returned no
    /// victims, or the retry bound ran out.
    pub fn admit(
        &mut self,
        key: &str,
        value: CacheValue,
        op: CacheOp,
    ) -> Result<AdmitOutcome, ConfigError> {
        let ttl = self.policies.ttl.estimate_ttl(key, &value, op);
        let admitted = self.policies.admission.should_cache(key, &value, ttl, op);
        self.stats.record_admission(admitted);

        if !admitted {
            debug!(key = %key, op = %op, "Admission declined");
            return Ok(AdmitOutcome::Rejected);
        }

        let mut evicted = 0;
        let mut state = AdmitState::Admitting;

        loop {
            state = match state {
                AdmitState::Admitting => self.try_write(key, &value, ttl, 0),
                AdmitState::Retrying { attempt } => self.try_write(key, &value, ttl, attempt),
                AdmitState::Evicting { attempt } => {
                    let victims = self.policies.eviction.trim_cache(&mut self.cache);
                    self.drain_expirations();

                    if victims.is_empty() {
                        let resident = self.cache.size();
                        self.drain_expirations();
                        AdmitState::Failed(ConfigError::EvictionNoProgress { resident })
                    } else {
                        for victim in victims {
                            debug!(key = %victim, "Evicted to make room");
                            evicted += 1;
                            self.stats.record_manual_evict();
                            self.publish(ObservationEvent::eviction(victim));
                        }
                        AdmitState::Retrying { attempt }
                    }
                }
                AdmitState::Succeeded => {
                    self.publish(ObservationEvent::write(key, ttl));
                    return Ok(AdmitOutcome::Cached { evicted });
                }
                AdmitState::Failed(err) => {
                    error!(key = %key, "Admission failed: {}", err);
                    return Err(err);
                }
            };
        }
    }

    // == Statistics ==
    /// Snapshot of the statistics with a fresh cache size.
    pub fn statistics(&mut self) -> CacheStatistics {
        let size = self.cache.size();
        self.drain_expirations();
        self.stats.set_cache_size(size);
        self.stats.clone()
    }

    /// Counters as of the last operation, without sweeping.
    pub fn stats(&self) -> &CacheStatistics {
        &self.stats
    }

    pub fn policy_names(&self) -> PolicyNames {
        self.policies.names()
    }

    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    /// The cache, for tests. Sweeping through this handle queues expiration
    /// events that are published on the manager's next operation.
    #[cfg(test)]
    pub(crate) fn cache(&mut self) -> &mut ExpiringStore {
        &mut self.cache
    }

    pub fn backend(&self) -> &dyn Storage {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Storage {
        self.backend.as_mut()
    }

    // == Internals ==
    /// Removes a cached `key`, counting and publishing the invalidation.
    fn invalidate(&mut self, key: &str) -> bool {
        let present = self.cache.contains(key);
        self.drain_expirations();
        if !present {
            return false;
        }

        self.stats.record_invalidation();
        self.cache.delete(key);
        self.drain_expirations();
        self.publish(ObservationEvent::invalidate(key));
        true
    }

    fn try_write(&mut self, key: &str, value: &CacheValue, ttl: Duration, attempt: usize) -> AdmitState {
        let result = self.cache.set(key.to_string(), value.clone(), ttl);
        self.drain_expirations();

        match result {
            Ok(()) => AdmitState::Succeeded,
            Err(_) if attempt >= self.retry_limit => AdmitState::Failed(ConfigError::RetryBoundExceeded {
                attempts: attempt,
            }),
            Err(_) => AdmitState::Evicting {
                attempt: attempt + 1,
            },
        }
    }

    fn drain_expirations(&mut self) {
        while let Ok(event) = self.expirations.try_recv() {
            self.stats.record_expiration();
            self.publish(event);
        }
    }

    fn publish(&mut self, event: ObservationEvent) {
        self.observers.publish(&mut self.policies, &event);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::error::ObserverError;
    use crate::observer::{EventKind, EventKindSet};
    use crate::strategies::{
        AlwaysCache, CacheOnMissOnly, EvictionStrategy, FixedTtl, LruEviction,
    };
    use serde_json::json;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<(String, EventKind)>>>;

    struct Recorder(Log);

    impl Observer for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn supported_observations(&self) -> EventKindSet {
            EventKindSet::ALL
        }

        fn observe(&mut self, event: &ObservationEvent) -> std::result::Result<(), ObserverError> {
            self.0.lock().unwrap().push((event.key.clone(), event.kind));
            Ok(())
        }
    }

    /// Claims to evict but never removes anything.
    struct Stubborn;

    impl Observer for Stubborn {
        fn name(&self) -> &'static str {
            "stubborn"
        }

        fn supported_observations(&self) -> EventKindSet {
            EventKindSet::EMPTY
        }

        fn observe(&mut self, _event: &ObservationEvent) -> std::result::Result<(), ObserverError> {
            Ok(())
        }
    }

    impl EvictionStrategy for Stubborn {
        fn trim_cache(&mut self, _cache: &mut ExpiringStore) -> Vec<String> {
            vec!["phantom".to_string()]
        }
    }

    struct Harness {
        manager: CacheManager,
        clock: ManualClock,
        log: Log,
    }

    fn harness_with(capacity: Option<usize>, policies: Policies) -> Harness {
        let clock = ManualClock::new(0);
        let cache = ExpiringStore::new(
            Box::new(InMemoryStorage::new(capacity)),
            Arc::new(clock.clone()),
        );
        let mut manager =
            CacheManager::new(cache, Box::new(InMemoryStorage::unbounded()), policies);
        let log: Log = Arc::default();
        manager.subscribe(Box::new(Recorder(log.clone())));
        Harness {
            manager,
            clock,
            log,
        }
    }

    fn lru_policies(ttl: Duration) -> Policies {
        Policies::new(
            Box::new(AlwaysCache),
            Box::new(FixedTtl::new(ttl)),
            Box::new(LruEviction::new()),
        )
    }

    fn harness(capacity: Option<usize>) -> Harness {
        harness_with(capacity, lru_policies(Duration::from_secs(100)))
    }

    fn kinds_for(log: &Log, key: &str) -> Vec<EventKind> {
        log.lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, kind)| *kind)
            .collect()
    }

    #[test]
    fn test_scenario_capacity_one_lru() {
        let mut h = harness(Some(1));

        h.manager.set("a", json!(1)).unwrap();
        assert!(h.manager.cache().contains("a"));

        let outcome = h.manager.set("b", json!(2)).unwrap();
        assert_eq!(outcome, AdmitOutcome::Cached { evicted: 1 });
        assert_eq!(h.manager.stats().manual_evicts, 1);
        assert!(!h.manager.cache().contains("a"));
        assert!(h.manager.cache().contains("b"));

        // "a" was never written to the origin store
        assert_eq!(h.manager.get("a").unwrap(), None);
        assert_eq!(h.manager.stats().misses, 1);

        assert_eq!(h.manager.get("b").unwrap(), Some(json!(2)));
        assert_eq!(h.manager.stats().hits, 1);
    }

    #[test]
    fn test_lru_order_respects_reads() {
        let mut h = harness(Some(2));

        h.manager.set("A", json!("a")).unwrap();
        h.manager.set("B", json!("b")).unwrap();
        h.manager.get("A").unwrap();
        h.manager.set("C", json!("c")).unwrap();

        let mut resident: Vec<_> = h.manager.cache().items().map(|(k, _)| k).collect();
        resident.sort();
        assert_eq!(resident, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(kinds_for(&h.log, "B").last(), Some(&EventKind::EvictionPolicy));
    }

    #[test]
    fn test_get_miss_fetches_from_backend_and_caches() {
        let mut h = harness(None);
        h.manager
            .backend_mut()
            .set("k".to_string(), json!({"name": "origin"}))
            .unwrap();

        assert_eq!(h.manager.get("k").unwrap(), Some(json!({"name": "origin"})));
        assert_eq!(h.manager.stats().misses, 1);
        assert_eq!(h.manager.stats().should_cache_true, 1);

        assert_eq!(h.manager.get("k").unwrap(), Some(json!({"name": "origin"})));
        assert_eq!(h.manager.stats().hits, 1);
        assert_eq!(
            kinds_for(&h.log, "k"),
            vec![EventKind::Miss, EventKind::Write, EventKind::Hit]
        );
    }

    #[test]
    fn test_miss_on_absent_origin_key_is_not_admitted() {
        let mut h = harness(None);

        assert_eq!(h.manager.get("nowhere").unwrap(), None);
        assert_eq!(h.manager.stats().should_cache_true, 0);
        assert_eq!(h.manager.stats().should_cache_false, 0);
        assert_eq!(kinds_for(&h.log, "nowhere"), vec![EventKind::Miss]);
    }

    #[test]
    fn test_set_existing_key_invalidates_then_writes() {
        let mut h = harness(None);

        h.manager.set("k", json!(1)).unwrap();
        h.manager.set("k", json!(2)).unwrap();

        assert_eq!(h.manager.stats().invalidations, 1);
        assert_eq!(h.manager.get("k").unwrap(), Some(json!(2)));
        assert_eq!(
            kinds_for(&h.log, "k"),
            vec![
                EventKind::Write,
                EventKind::Invalidate,
                EventKind::Write,
                EventKind::Hit
            ]
        );
    }

    #[test]
    fn test_delete_present_and_absent() {
        let mut h = harness(None);
        h.manager.set("k", json!(1)).unwrap();

        assert!(h.manager.delete("k"));
        assert_eq!(h.manager.stats().invalidations, 1);

        // Absent key: no error, no counter change
        assert!(!h.manager.delete("k"));
        assert!(!h.manager.delete("never"));
        assert_eq!(h.manager.stats().invalidations, 1);
    }

    #[test]
    fn test_update_resets_ttl_with_single_expiration() {
        let clock = ManualClock::new(0);
        let cache = ExpiringStore::new(
            Box::new(InMemoryStorage::unbounded()),
            Arc::new(clock.clone()),
        );
        let mut manager = CacheManager::new(
            cache,
            Box::new(InMemoryStorage::unbounded()),
            lru_policies(Duration::from_millis(100)),
        );
        let log: Log = Arc::default();
        manager.subscribe(Box::new(Recorder(log.clone())));

        manager.set("k", json!(1)).unwrap();
        manager.cache().set("k".to_string(), json!(2), Duration::from_millis(5)).unwrap();

        clock.advance(Duration::from_millis(6));
        assert_eq!(manager.get("k").unwrap(), None);

        clock.advance(Duration::from_millis(200));
        manager.statistics();

        let expirations = kinds_for(&log, "k")
            .into_iter()
            .filter(|k| *k == EventKind::Expiration)
            .count();
        assert_eq!(expirations, 1);
        assert_eq!(manager.stats().expirations, 1);
    }

    #[test]
    fn test_expiration_is_published_before_miss() {
        let mut h = harness(None);
        h.manager.set("k", json!(1)).unwrap();

        h.clock.advance(Duration::from_secs(100));
        assert_eq!(h.manager.get("k").unwrap(), None);

        assert_eq!(
            kinds_for(&h.log, "k"),
            vec![EventKind::Write, EventKind::Expiration, EventKind::Miss]
        );
        assert_eq!(h.manager.stats().expirations, 1);
        assert_eq!(h.manager.stats().invalidations, 0);
    }

    #[test]
    fn test_zero_capacity_fails_instead_of_looping() {
        let mut h = harness(Some(0));

        let result = h.manager.set("k", json!(1));
        assert_eq!(result, Err(ConfigError::EvictionNoProgress { resident: 0 }));
        assert_eq!(h.manager.stats().should_cache_true, 1);
        assert_eq!(h.manager.stats().manual_evicts, 0);
    }

    #[test]
    fn test_retry_bound_stops_misbehaving_strategy() {
        let policies = Policies::new(
            Box::new(AlwaysCache),
            Box::new(FixedTtl::new(Duration::from_secs(10))),
            Box::new(Stubborn),
        );
        let mut h = harness_with(Some(1), policies);
        h.manager = h.manager.with_retry_limit(3);

        h.manager.set("a", json!(1)).unwrap();
        let result = h.manager.set("b", json!(2));

        assert_eq!(result, Err(ConfigError::RetryBoundExceeded { attempts: 3 }));
        assert_eq!(h.manager.stats().manual_evicts, 3);
        assert!(h.manager.cache().contains("a"));
    }

    #[test]
    fn test_zero_retry_limit_still_allows_one_eviction() {
        let mut h = harness(Some(1));
        h.manager = h.manager.with_retry_limit(0);

        h.manager.set("a", json!(1)).unwrap();
        let outcome = h.manager.set("b", json!(2)).unwrap();

        assert_eq!(outcome, AdmitOutcome::Cached { evicted: 1 });
        assert!(h.manager.cache().contains("b"));
    }

    #[test]
    fn test_read_only_admission_skips_writes() {
        let policies = Policies::new(
            Box::new(CacheOnMissOnly),
            Box::new(FixedTtl::new(Duration::from_secs(10))),
            Box::new(LruEviction::new()),
        );
        let mut h = harness_with(None, policies);

        let outcome = h.manager.set("k", json!(1)).unwrap();
        assert_eq!(outcome, AdmitOutcome::Rejected);
        assert_eq!(h.manager.stats().should_cache_false, 1);
        assert!(!h.manager.cache().contains("k"));

        h.manager.backend_mut().set("k".to_string(), json!(1)).unwrap();
        h.manager.get("k").unwrap();
        assert!(h.manager.cache().contains("k"));
        assert_eq!(h.manager.stats().should_cache_true, 1);
    }

    #[test]
    fn test_statistics_snapshot_reports_size_and_capacity() {
        let mut h = harness(Some(10));
        h.manager.set("a", json!(1)).unwrap();
        h.manager.set("b", json!(2)).unwrap();

        let stats = h.manager.statistics();
        assert_eq!(stats.cache_size, 2);
        assert_eq!(stats.capacity, Some(10));

        h.clock.advance(Duration::from_secs(100));
        let stats = h.manager.statistics();
        assert_eq!(stats.cache_size, 0);
        assert_eq!(stats.expirations, 2);
    }
}
