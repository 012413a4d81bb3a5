//! Configuration Module
//!
//! Loads server and policy configuration from environment variables, or
//! from a JSON file when `CONFIG_FILE` is set.

use std::env;
use std::fs;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_EVICTION_RETRY_LIMIT;
use crate::error::ConfigError;
use crate::strategies::{AdmissionConfig, EvictionConfig, PolicyConfig, TtlConfig};

/// Server configuration parameters.
///
/// Every field has a default; a config file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache capacity in entries, None = unbounded
    pub cache_capacity: Option<usize>,
    /// Origin store capacity in entries, None = unbounded
    pub backend_capacity: Option<usize>,
    /// Bound on evict-and-retry rounds per admission
    pub eviction_retry_limit: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Seconds between statistics log lines, 0 disables the reporter
    pub stats_interval: u64,
    /// Strategy selection per role
    pub policies: PolicyConfig,
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `CONFIG_FILE` - JSON config file; when set, the other variables are ignored
    /// - `CACHE_CAPACITY` - Cache entries, or `none` (default: 1000)
    /// - `BACKEND_CAPACITY` - Origin entries, or `none` (default: none)
    /// - `DEFAULT_TTL` - TTL in seconds for the fixed strategy (default: 300)
    /// - `ADMISSION_STRATEGY` - `read_write` or `read_only` (default: read_write)
    /// - `EVICTION_STRATEGY` - `lru`, `fifo` or `lfu` (default: lru)
    /// - `EVICTION_RETRY_LIMIT` - Evict-and-retry bound (default: 16)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STATS_INTERVAL` - Statistics log interval in seconds (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = env::var("CONFIG_FILE") {
            return Self::from_file(&path);
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| ConfigError::ConfigFile {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        config.validate()
    }

    /// Builds the configuration from a variable lookup, defaulting what is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cache_capacity = match lookup("CACHE_CAPACITY") {
            Some(v) => parse_capacity("CACHE_CAPACITY", &v)?,
            None => defaults.cache_capacity,
        };
        let backend_capacity = match lookup("BACKEND_CAPACITY") {
            Some(v) => parse_capacity("BACKEND_CAPACITY", &v)?,
            None => defaults.backend_capacity,
        };

        let mut policies = defaults.policies;
        if let Some(v) = lookup("ADMISSION_STRATEGY") {
            policies.admission = v.parse::<AdmissionConfig>()?;
        }
        if let Some(v) = lookup("EVICTION_STRATEGY") {
            policies.eviction = v.parse::<EvictionConfig>()?;
        }
        if let Some(v) = lookup("DEFAULT_TTL") {
            policies.ttl = TtlConfig::Fixed {
                ttl_secs: parse("DEFAULT_TTL", &v)?,
            };
        }

        Self {
            cache_capacity,
            backend_capacity,
            eviction_retry_limit: parse_or(
                "EVICTION_RETRY_LIMIT",
                lookup("EVICTION_RETRY_LIMIT"),
                defaults.eviction_retry_limit,
            )?,
            server_port: parse_or("SERVER_PORT", lookup("SERVER_PORT"), defaults.server_port)?,
            stats_interval: parse_or(
                "STATS_INTERVAL",
                lookup("STATS_INTERVAL"),
                defaults.stats_interval,
            )?,
            policies,
        }
        .validate()
    }

    /// Rejects values the manager cannot run with.
    ///
    /// A retry limit of 0 would fail every write to a full cache before a
    /// single eviction round.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.eviction_retry_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "EVICTION_RETRY_LIMIT",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: Some(1000),
            backend_capacity: None,
            eviction_retry_limit: DEFAULT_EVICTION_RETRY_LIMIT,
            server_port: 3000,
            stats_interval: 0,
            policies: PolicyConfig::default(),
        }
    }
}

fn parse<T: FromStr>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

fn parse_or<T: FromStr>(
    field: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    value.map_or(Ok(default), |v| parse(field, &v))
}

/// `none` or `unbounded` mean no capacity limit.
fn parse_capacity(field: &'static str, value: &str) -> Result<Option<usize>, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" | "unbounded" => Ok(None),
        _ => parse(field, value).map(Some),
    }
}
