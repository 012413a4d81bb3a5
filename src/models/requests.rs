//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::{CacheValue, MAX_KEY_LENGTH};

/// Checks a key against the server's key rules.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Request body naming a single key (POST /get, DELETE /delete)
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

impl KeyRequest {
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for POST /insert and POST /update
///
/// # Fields
/// - `key`: The key to write
/// - `values`: Any JSON document
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    pub key: String,
    pub values: CacheValue,
}

impl WriteRequest {
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}
