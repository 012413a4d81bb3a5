//! Error types for the cache engine and server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Out Of Memory ==
/// Returned by a store's `set` when it is at capacity and the key is new.
///
/// Recoverable: the manager answers it by running the eviction strategy and
/// retrying the write.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Store is full (capacity {capacity})")]
pub struct OutOfMemory {
    /// Capacity of the store that rejected the write
    pub capacity: usize,
}

// == Config Error ==
/// Fatal inconsistencies between the configured policies and capacities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The eviction strategy returned no victims while the cache was full
    #[error("Eviction strategy made no progress ({resident} resident entries)")]
    EvictionNoProgress { resident: usize },

    /// The evict-and-retry loop ran out of attempts
    #[error("Eviction retry bound exceeded after {attempts} attempts")]
    RetryBoundExceeded { attempts: usize },

    /// A strategy name that no factory knows about
    #[error("Unknown {role} strategy: {name}")]
    UnknownStrategy { role: &'static str, name: String },

    /// A configuration value that could not be parsed
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// The configuration file could not be read or parsed
    #[error("Failed to load config file {path}: {reason}")]
    ConfigFile { path: String, reason: String },
}

// == Observer Error ==
/// Raised by a policy while observing an event.
///
/// Never leaves the dispatcher; it is logged and delivery continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Observer {observer} failed: {reason}")]
pub struct ObserverError {
    pub observer: &'static str,
    pub reason: String,
}

impl ObserverError {
    pub fn new(observer: &'static str, reason: impl Into<String>) -> Self {
        Self {
            observer,
            reason: reason.into(),
        }
    }
}

// == Cache Error Enum ==
/// Unified error type for the cache server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Origin store is full
    #[error("Cache full: {0}")]
    CacheFull(#[from] OutOfMemory),

    /// Policies and capacity are mutually inconsistent
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::CacheFull(_) => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
