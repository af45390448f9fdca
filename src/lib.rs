//! Sized Cache - A size-bounded in-process object cache
//!
//! Provides an LRU cache that evicts by total payload size, plus a small
//! HTTP service exposing it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::{AppState, ByteCache};
pub use cache::{Cache, CacheStats, Payload};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_report_task;
