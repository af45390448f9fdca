//! Cache Statistics Module
//!
//! Tracks cache performance metrics and occupancy.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters and occupancy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals
    pub misses: u64,
    /// Number of entries removed by size eviction or the entry cap
    pub evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Bytes occupied by live entries
    pub usage: u64,
    /// Configured capacity in bytes
    pub capacity: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Utilization ==
    /// Fraction of capacity currently occupied.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.usage as f64 / self.capacity as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
