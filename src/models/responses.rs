//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{AdmitOutcome, CacheStatistics, CacheValue};
use crate::strategies::PolicyNames;

/// Response body for POST /get
///
/// `values` is null when neither the cache nor the origin holds the key.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub values: CacheValue,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, values: Option<CacheValue>) -> Self {
        Self {
            key: key.into(),
            values: values.unwrap_or(CacheValue::Null),
        }
    }
}

/// Response body for POST /insert and POST /update
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    pub key: String,
    /// Whether the admission strategy let the value into the cache
    pub cached: bool,
    /// Entries evicted to make room
    pub evicted: usize,
}

impl WriteResponse {
    pub fn new(key: impl Into<String>, outcome: AdmitOutcome) -> Self {
        let (cached, evicted) = match outcome {
            AdmitOutcome::Rejected => (false, 0),
            AdmitOutcome::Cached { evicted } => (true, evicted),
        };
        Self {
            key: key.into(),
            cached,
            evicted,
        }
    }
}

/// Response body for DELETE /delete
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub key: String,
    /// False when neither the cache nor the origin held the key
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            key: key.into(),
            deleted,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub statistics: CacheStatistics,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Entries held by the origin store
    pub backend_size: usize,
    /// Active strategy per role
    pub policies: PolicyNames,
}

impl StatsResponse {
    pub fn new(statistics: CacheStatistics, backend_size: usize, policies: PolicyNames) -> Self {
        Self {
            hit_rate: statistics.hit_rate(),
            statistics,
            backend_size,
            policies,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn names() -> PolicyNames {
        PolicyNames {
            admission: "read_write",
            ttl: "fixed",
            eviction: "lru",
        }
    }

    #[test]
    fn test_get_response_absent_values_is_null() {
        let resp = GetResponse::new("missing", None);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"key": "missing", "values": null}));
    }

    #[test]
    fn test_write_response_from_outcome() {
        let resp = WriteResponse::new("k", AdmitOutcome::Cached { evicted: 2 });
        assert!(resp.cached);
        assert_eq!(resp.evicted, 2);

        let resp = WriteResponse::new("k", AdmitOutcome::Rejected);
        assert!(!resp.cached);
        assert_eq!(resp.evicted, 0);
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("gone", true);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"key": "gone", "deleted": true}));
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let mut stats = CacheStatistics::new(Some(10));
        stats.hits = 3;
        stats.misses = 1;
        let resp = StatsResponse::new(stats, 7, names());

        let json: Value = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["hits"], 3);
        assert_eq!(json["capacity"], 10);
        assert_eq!(json["backend_size"], 7);
        assert_eq!(json["policies"]["eviction"], "lru");
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::new(CacheStatistics::new(None), 0, names());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
