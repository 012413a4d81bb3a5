//! Cache Module
//!
//! Storage backends, the TTL-aware expiring store, and the manager that
//! drives them through the configured policies.

pub mod clock;
mod expiring;
mod manager;
mod stats;
mod storage;


// Re-export public types
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use expiring::{ExpirationListener, ExpiringStore};
pub use manager::{AdmitOutcome, CacheManager, DEFAULT_EVICTION_RETRY_LIMIT};
pub use stats::CacheStatistics;
pub use storage::{InMemoryStorage, Items, Storage};

/// Values are arbitrary JSON documents.
pub type CacheValue = serde_json::Value;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
