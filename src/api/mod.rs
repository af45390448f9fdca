//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /entries/:key` - Store the request body under a key
//! - `GET /entries/:key` - Retrieve the stored bytes
//! - `DELETE /entries/:key` - Delete a key
//! - `DELETE /entries` - Clear the cache
//! - `GET /exists/:key` - Check whether a key is cached
//! - `PUT /capacity` - Resize the cache
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
