//! TTL Estimation Strategies
//!
//! Choose how long an admitted value stays in the cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::clock::{duration_ms, SharedClock, SystemClock};
use crate::cache::CacheValue;
use crate::error::ObserverError;
use crate::observer::{EventKind, EventKindSet, ObservationEvent, Observer};
use crate::strategies::CacheOp;

// == TTL Strategy ==
pub trait TtlStrategy: Observer {
    fn estimate_ttl(&mut self, key: &str, value: &CacheValue, op: CacheOp) -> Duration;
}

/// What FixedTtl remembers about a resident key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    pub written_at: u64,
    pub estimated: Duration,
    pub hits: u64,
}

// == Fixed TTL ==
/// Returns the same TTL for every value.
///
/// Also follows each key from write to departure and logs the estimated
/// lifetime next to the real one.
pub struct FixedTtl {
    ttl: Duration,
    clock: SharedClock,
    observed: HashMap<String, Lifetime>,
}

impl FixedTtl {
    const OBSERVATIONS: EventKindSet = EventKindSet::of(&[
        EventKind::Write,
        EventKind::Hit,
        EventKind::Invalidate,
        EventKind::Expiration,
        EventKind::EvictionPolicy,
    ]);

    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            ttl,
            clock,
            observed: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Tracking state for `key`, if it is resident.
    pub fn lifetime(&self, key: &str) -> Option<Lifetime> {
        self.observed.get(key).copied()
    }

    /// Number of keys currently followed.
    pub fn tracked(&self) -> usize {
        self.observed.len()
    }
}

impl Observer for FixedTtl {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn supported_observations(&self) -> EventKindSet {
        Self::OBSERVATIONS
    }

    fn observe(&mut self, event: &ObservationEvent) -> Result<(), ObserverError> {
        let now = self.clock.now_ms();

        match event.kind {
            EventKind::Write => {
                let estimated = event.ttl().unwrap_or(self.ttl);
                self.observed.insert(
                    event.key.clone(),
                    Lifetime {
                        written_at: now,
                        estimated,
                        hits: 0,
                    },
                );
            }
            EventKind::Hit => {
                if let Some(lifetime) = self.observed.get_mut(&event.key) {
                    lifetime.hits += 1;
                }
            }
            EventKind::Invalidate | EventKind::Expiration | EventKind::EvictionPolicy => {
                if let Some(lifetime) = self.observed.remove(&event.key) {
                    debug!(
                        key = %event.key,
                        reason = %event.kind,
                        estimated_ms = duration_ms(lifetime.estimated),
                        real_ms = now.saturating_sub(lifetime.written_at),
                        hits = lifetime.hits,
                        "Entry left the cache"
                    );
                }
            }
            EventKind::Miss => {}
        }

        Ok(())
    }
}

impl TtlStrategy for FixedTtl {
    fn estimate_ttl(&mut self, _key: &str, _value: &CacheValue, _op: CacheOp) -> Duration {
        self.ttl
    }
}
