//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::Cache;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, CapacityRequest, ClearResponse, DeleteResponse, ExistsResponse,
    HealthResponse, SetResponse, StatsResponse,
};

/// Cache of raw request bodies served over HTTP.
///
/// Bodies are kept as `Bytes`, so storing and serving a payload only bumps
/// a reference count.
pub type ByteCache = Cache<Bytes>;

/// Application state shared across all handlers.
///
/// The cache does its own locking, so handlers only need a shared reference.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ByteCache>,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: ByteCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(ByteCache::from_config(&config.cache))
    }
}

fn checked_key(key: String) -> Result<String> {
    match validate_key(&key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(key),
    }
}

/// Handler for PUT /entries/:key
///
/// Stores the raw request body under `key`.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<SetResponse>> {
    let key = checked_key(key)?;
    let size = body.len() as u64;

    state.cache.insert(key.clone(), Arc::new(body))?;

    Ok(Json(SetResponse::new(key, size)))
}

/// Handler for GET /entries/:key
///
/// Returns the stored bytes as `application/octet-stream`.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let payload = state
        .cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Bytes::clone(&payload),
    )
        .into_response())
}

/// Handler for GET /exists/:key
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ExistsResponse> {
    let exists = state.cache.exists(&key);
    Json(ExistsResponse { key, exists })
}

/// Handler for DELETE /entries/:key
///
/// Deleting a key that is not cached still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let removed = state.cache.erase(&key);
    Json(DeleteResponse::new(key, removed))
}

/// Handler for DELETE /entries
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.clear();
    Json(ClearResponse::new(removed))
}

/// Handler for PUT /capacity
///
/// Resizes the cache, evicting if it is now over capacity. A capacity of 0
/// is ignored. Responds with the resulting statistics.
pub async fn capacity_handler(
    State(state): State<AppState>,
    Json(req): Json<CapacityRequest>,
) -> Json<StatsResponse> {
    state.cache.set_capacity(req.capacity);
    Json(state.cache.stats().into())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
