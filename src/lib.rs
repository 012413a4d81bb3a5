//! Policy Cache - A TTL-aware cache manager with pluggable policies
//!
//! Admission, eviction and TTL decisions are strategy objects that learn
//! from the cache's event stream. The manager reads through to an origin
//! store and evicts-and-retries when the cache is full.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod observer;
pub mod strategies;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, ExpiringStore};
pub use config::Config;
pub use tasks::spawn_stats_reporter;
