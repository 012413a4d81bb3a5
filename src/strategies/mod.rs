//! Strategies Module
//!
//! The three policy roles the manager consults:
//! - Admission: is this value worth caching at all?
//! - TTL estimation: how long should it stay?
//! - Eviction: which resident entry goes when the cache is full?
//!
//! Every role is also an [`Observer`](crate::observer::Observer) so it can
//! keep per-key history from the event stream.

pub mod admission;
pub mod eviction;
pub mod factory;
pub mod ttl;

use std::fmt;

use serde::Serialize;

pub use admission::{AdmissionStrategy, AlwaysCache, CacheOnMissOnly};
pub use eviction::{EvictionStrategy, FifoEviction, LfuEviction, LruEviction};
pub use factory::{AdmissionConfig, EvictionConfig, PolicyConfig, TtlConfig};
pub use ttl::{FixedTtl, TtlStrategy};

// == Cache Op ==
/// Why a value is being offered to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOp {
    /// Write of a key the cache did not hold
    New,
    /// Write of a key the cache held (and just invalidated)
    Update,
    /// Read that fell through to the origin store
    Miss,
}

impl fmt::Display for CacheOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheOp::New => "new",
            CacheOp::Update => "update",
            CacheOp::Miss => "miss",
        };
        f.write_str(name)
    }
}

// == Policies ==
/// One strategy per role, owned by the cache manager.
pub struct Policies {
    pub admission: Box<dyn AdmissionStrategy>,
    pub ttl: Box<dyn TtlStrategy>,
    pub eviction: Box<dyn EvictionStrategy>,
}

impl Policies {
    pub fn new(
        admission: Box<dyn AdmissionStrategy>,
        ttl: Box<dyn TtlStrategy>,
        eviction: Box<dyn EvictionStrategy>,
    ) -> Self {
        Self {
            admission,
            ttl,
            eviction,
        }
    }

    /// Strategy names per role, for logs and the stats endpoint.
    pub fn names(&self) -> PolicyNames {
        PolicyNames {
            admission: self.admission.name(),
            ttl: self.ttl.name(),
            eviction: self.eviction.name(),
        }
    }
}

impl fmt::Debug for Policies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policies")
            .field("admission", &self.admission.name())
            .field("ttl", &self.ttl.name())
            .field("eviction", &self.eviction.name())
            .finish()
    }
}

/// Names of the active strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyNames {
    pub admission: &'static str,
    pub ttl: &'static str,
    pub eviction: &'static str,
}
