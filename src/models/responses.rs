//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for storing an entry (PUT /entries/:key)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Size of the stored payload in bytes
    pub size: u64,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            size,
        }
    }
}

/// Response body for removing an entry (DELETE /entries/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Outcome message
    pub message: String,
    /// The key that was requested
    pub key: String,
    /// Whether an entry was actually removed
    pub removed: bool,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, removed: bool) -> Self {
        let key = key.into();
        let message = if removed {
            format!("Key '{}' deleted successfully", key)
        } else {
            format!("Key '{}' was not cached", key)
        };
        Self {
            message,
            key,
            removed,
        }
    }
}

/// Response body for membership checks (GET /exists/:key)
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for clearing the cache (DELETE /entries)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Number of entries present before the clear
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Cleared {} entries", removed),
            removed,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Bytes occupied by live entries
    pub usage: u64,
    /// Capacity in bytes
    pub capacity: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Usage as a fraction of capacity
    pub utilization: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            utilization: stats.utilization(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            usage: stats.usage,
            capacity: stats.capacity,
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
