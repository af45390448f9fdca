//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_key, CapacityRequest, MAX_KEY_LENGTH};
pub use responses::{
    ClearResponse, DeleteResponse, ExistsResponse, HealthResponse, SetResponse, StatsResponse,
};
