//! Strategy Factory
//!
//! Tagged configuration per role, resolved into boxed strategies.
//!
//! ```json
//! {
//!   "admission": { "type": "read_only" },
//!   "eviction": { "type": "lfu" },
//!   "ttl": { "type": "fixed", "ttl_secs": 60 }
//! }
//! ```

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::clock::SharedClock;
use crate::error::ConfigError;
use crate::strategies::{
    AdmissionStrategy, AlwaysCache, CacheOnMissOnly, EvictionStrategy, FifoEviction, FixedTtl,
    LfuEviction, LruEviction, Policies, TtlStrategy,
};

/// TTL used when none is configured, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

// == Admission Config ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdmissionConfig {
    /// Cache on reads and writes
    #[default]
    #[serde(alias = "always_cache")]
    ReadWrite,
    /// Cache on read misses only
    #[serde(alias = "cache_on_miss_only")]
    ReadOnly,
}

impl AdmissionConfig {
    pub fn build(self) -> Box<dyn AdmissionStrategy> {
        match self {
            AdmissionConfig::ReadWrite => Box::new(AlwaysCache),
            AdmissionConfig::ReadOnly => Box::new(CacheOnMissOnly),
        }
    }
}

impl FromStr for AdmissionConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read_write" | "always_cache" => Ok(AdmissionConfig::ReadWrite),
            "read_only" | "cache_on_miss_only" => Ok(AdmissionConfig::ReadOnly),
            other => Err(ConfigError::UnknownStrategy {
                role: "admission",
                name: other.to_string(),
            }),
        }
    }
}

// == Eviction Config ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvictionConfig {
    #[default]
    Lru,
    Fifo,
    Lfu,
}

impl EvictionConfig {
    pub fn build(self) -> Box<dyn EvictionStrategy> {
        match self {
            EvictionConfig::Lru => Box::new(LruEviction::new()),
            EvictionConfig::Fifo => Box::new(FifoEviction::new()),
            EvictionConfig::Lfu => Box::new(LfuEviction::new()),
        }
    }
}

impl FromStr for EvictionConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionConfig::Lru),
            "fifo" => Ok(EvictionConfig::Fifo),
            "lfu" => Ok(EvictionConfig::Lfu),
            other => Err(ConfigError::UnknownStrategy {
                role: "eviction",
                name: other.to_string(),
            }),
        }
    }
}

// == TTL Config ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TtlConfig {
    Fixed { ttl_secs: u64 },
}

impl Default for TtlConfig {
    fn default() -> Self {
        TtlConfig::Fixed {
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl TtlConfig {
    pub fn build(self, clock: SharedClock) -> Box<dyn TtlStrategy> {
        match self {
            TtlConfig::Fixed { ttl_secs } => {
                Box::new(FixedTtl::with_clock(Duration::from_secs(ttl_secs), clock))
            }
        }
    }
}

// == Policy Config ==
/// Strategy selection for all three roles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub admission: AdmissionConfig,
    pub eviction: EvictionConfig,
    pub ttl: TtlConfig,
}

impl Policies {
    /// Instantiates the configured strategy for each role.
    pub fn from_config(config: &PolicyConfig, clock: SharedClock) -> Self {
        Policies::new(
            config.admission.build(),
            config.ttl.build(clock),
            config.eviction.build(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::SystemClock;
    use std::sync::Arc;

    #[test]
    fn test_parse_strategy_names() {
        assert_eq!("lru".parse::<EvictionConfig>().unwrap(), EvictionConfig::Lru);
        assert_eq!("FIFO".parse::<EvictionConfig>().unwrap(), EvictionConfig::Fifo);
        assert_eq!(
            "read_only".parse::<AdmissionConfig>().unwrap(),
            AdmissionConfig::ReadOnly
        );
        assert_eq!(
            "always_cache".parse::<AdmissionConfig>().unwrap(),
            AdmissionConfig::ReadWrite
        );
    }

    #[test]
    fn test_unknown_strategy_name() {
        let err = "rl_driven".parse::<EvictionConfig>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownStrategy {
                role: "eviction",
                name: "rl_driven".to_string()
            }
        );
    }

    #[test]
    fn test_deserialize_tagged_config() {
        let json = r#"{
            "admission": {"type": "read_only"},
            "eviction": {"type": "lfu"},
            "ttl": {"type": "fixed", "ttl_secs": 60}
        }"#;
        let config: PolicyConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.admission, AdmissionConfig::ReadOnly);
        assert_eq!(config.eviction, EvictionConfig::Lfu);
        assert_eq!(config.ttl, TtlConfig::Fixed { ttl_secs: 60 });
    }

    #[test]
    fn test_deserialize_partial_config_uses_defaults() {
        let config: PolicyConfig = serde_json::from_str(r#"{"eviction": {"type": "fifo"}}"#).unwrap();

        assert_eq!(config.admission, AdmissionConfig::ReadWrite);
        assert_eq!(config.eviction, EvictionConfig::Fifo);
        assert_eq!(config.ttl, TtlConfig::default());
    }

    #[test]
    fn test_build_policies() {
        let config = PolicyConfig {
            admission: AdmissionConfig::ReadOnly,
            eviction: EvictionConfig::Fifo,
            ttl: TtlConfig::Fixed { ttl_secs: 5 },
        };
        let policies = Policies::from_config(&config, Arc::new(SystemClock));
        let names = policies.names();

        assert_eq!(names.admission, "read_only");
        assert_eq!(names.eviction, "fifo");
        assert_eq!(names.ttl, "fixed");
    }
}
