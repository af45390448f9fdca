//! Cache Module
//!
//! Provides a size-bounded in-memory cache with LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Payload};
pub use lru::{LruIter, RecencyIndex};
pub use stats::CacheStats;
pub use store::Cache;
