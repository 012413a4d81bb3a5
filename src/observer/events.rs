//! Observation Events
//!
//! Lifecycle events published by the manager and the expiring store.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheValue;

// == Event Kind ==
/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Hit,
    Miss,
    Write,
    Invalidate,
    Expiration,
    EvictionPolicy,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Hit,
        EventKind::Miss,
        EventKind::Write,
        EventKind::Invalidate,
        EventKind::Expiration,
        EventKind::EvictionPolicy,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Hit => "hit",
            EventKind::Miss => "miss",
            EventKind::Write => "write",
            EventKind::Invalidate => "invalidate",
            EventKind::Expiration => "expiration",
            EventKind::EvictionPolicy => "eviction_policy",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Event Kind Set ==
/// The event kinds an observer subscribes to.
///
/// Declared once per observer and checked by the dispatcher before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventKindSet(u8);

impl EventKindSet {
    pub const EMPTY: EventKindSet = EventKindSet(0);

    pub const ALL: EventKindSet = EventKindSet::of(&EventKind::ALL);

    /// Builds a set from a list of kinds.
    pub const fn of(kinds: &[EventKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        EventKindSet(bits)
    }

    pub const fn with(self, kind: EventKind) -> Self {
        EventKindSet(self.0 | kind.bit())
    }

    pub const fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

// == Event Payload ==
/// Kind-specific data carried by an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    None,
    /// TTL the entry was written with
    Write { ttl: Duration },
    /// Value the sweep removed and the instant it was scheduled to leave
    Expiration { value: CacheValue, expired_at: u64 },
}

// == Observation Event ==
/// A single lifecycle event for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationEvent {
    pub key: String,
    pub kind: EventKind,
    pub payload: EventPayload,
}

impl ObservationEvent {
    fn bare(key: impl Into<String>, kind: EventKind) -> Self {
        Self {
            key: key.into(),
            kind,
            payload: EventPayload::None,
        }
    }

    pub fn hit(key: impl Into<String>) -> Self {
        Self::bare(key, EventKind::Hit)
    }

    pub fn miss(key: impl Into<String>) -> Self {
        Self::bare(key, EventKind::Miss)
    }

    pub fn invalidate(key: impl Into<String>) -> Self {
        Self::bare(key, EventKind::Invalidate)
    }

    pub fn eviction(key: impl Into<String>) -> Self {
        Self::bare(key, EventKind::EvictionPolicy)
    }

    pub fn write(key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            kind: EventKind::Write,
            payload: EventPayload::Write { ttl },
        }
    }

    pub fn expiration(key: impl Into<String>, value: CacheValue, expired_at: u64) -> Self {
        Self {
            key: key.into(),
            kind: EventKind::Expiration,
            payload: EventPayload::Expiration { value, expired_at },
        }
    }

    /// TTL carried by a `Write` event.
    pub fn ttl(&self) -> Option<Duration> {
        match self.payload {
            EventPayload::Write { ttl } => Some(ttl),
            _ => None,
        }
    }
}
