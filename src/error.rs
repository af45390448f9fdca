//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP surface.
///
/// Absent keys are not errors for the cache itself (`get` returns `None`,
/// `erase` is a no-op); `NotFound` is only raised by the recency index and
/// by the HTTP layer when it has to answer with a 404.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payload alone is larger than the whole cache capacity
    #[error("Entry too large: key '{key}' has {size} bytes, capacity is {capacity} bytes")]
    EntryTooLarge {
        key: String,
        size: u64,
        capacity: u64,
    },
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::EntryTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
