//! Request DTOs for the cache server API
//!
//! Defines incoming request bodies and key validation.

use serde::Deserialize;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Validates a cache key taken from the request path.
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

/// Request body for resizing the cache (PUT /capacity)
#[derive(Debug, Clone, Deserialize)]
pub struct CapacityRequest {
    /// New capacity in bytes; 0 leaves the capacity unchanged
    pub capacity: u64,
}
