//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Cache semantics
//! live in [`CacheManager`]; handlers validate, lock and write through to
//! the origin store.

use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{extract::State, Json};
use tracing::debug;

use crate::cache::{CacheManager, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, KeyRequest, StatsResponse, WriteRequest,
    WriteResponse,
};

/// Application state shared across all handlers.
///
/// The mutex is the single exclusion boundary around the manager and
/// everything it owns.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<Mutex<CacheManager>>,
}

impl AppState {
    pub fn new(manager: CacheManager) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
        }
    }

    /// Creates a new AppState from configuration, on the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheManager::from_config(config, Arc::new(SystemClock)))
    }
}

/// Handler for POST /get
///
/// Reads through the cache to the origin store.
pub async fn get_handler(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut manager = state.manager.lock().await;
    let values = manager.get(&req.key)?;

    Ok(Json(GetResponse::new(req.key, values)))
}

/// Handler for POST /insert
pub async fn insert_handler(
    State(state): State<AppState>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    write_through(&state, req).await
}

/// Handler for POST /update
pub async fn update_handler(
    State(state): State<AppState>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    write_through(&state, req).await
}

/// Stores the value in the origin, then offers it to the cache.
///
/// A write the origin rejects never reaches the cache.
async fn write_through(state: &AppState, req: WriteRequest) -> Result<Json<WriteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut manager = state.manager.lock().await;
    manager.backend_mut().set(req.key.clone(), req.values.clone())?;
    let outcome = manager.set(&req.key, req.values)?;
    debug!(key = %req.key, ?outcome, "Value written");

    Ok(Json(WriteResponse::new(req.key, outcome)))
}

/// Handler for DELETE /delete
///
/// Drops the key from both the cache and the origin store. An absent key
/// answers `deleted: false`.
pub async fn delete_handler(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut manager = state.manager.lock().await;
    let cached = manager.delete(&req.key);
    let stored = manager.backend_mut().delete(&req.key);

    Ok(Json(DeleteResponse::new(req.key, cached || stored)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let mut manager = state.manager.lock().await;
    let statistics = manager.statistics();

    Json(StatsResponse::new(
        statistics,
        manager.backend().size(),
        manager.policy_names(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
