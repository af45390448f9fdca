//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Default post-eviction target as a fraction of capacity.
pub const DEFAULT_THRESHOLD_RATIO: f64 = 0.85;

/// Default cache capacity in bytes (64 MiB).
pub const DEFAULT_CAPACITY: u64 = 64 * 1024 * 1024;

/// Parameters of a single bounded cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Soft ceiling on the summed payload size, in bytes
    pub capacity: u64,
    /// Optional hard cap on the number of entries
    pub max_entries: Option<usize>,
    /// Fraction of capacity that eviction frees down to
    pub threshold_ratio: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_entries: None,
            threshold_ratio: DEFAULT_THRESHOLD_RATIO,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings for the cache served by this process
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Interval in seconds between cache state reports
    pub report_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Cache capacity in bytes (default: 64 MiB)
    /// - `CACHE_MAX_ENTRIES` - Maximum entry count, 0 for unbounded (default: 0)
    /// - `CACHE_EVICTION_THRESHOLD` - Post-eviction usage ratio in (0, 1] (default: 0.85)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REPORT_INTERVAL` - State report frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_entries: usize = env_or("CACHE_MAX_ENTRIES", 0);

        Self {
            cache: CacheConfig {
                capacity: checked_capacity(env_or("CACHE_CAPACITY", defaults.cache.capacity)),
                max_entries: (max_entries > 0).then_some(max_entries),
                threshold_ratio: checked_threshold(env_or(
                    "CACHE_EVICTION_THRESHOLD",
                    DEFAULT_THRESHOLD_RATIO,
                )),
            },
            server_port: env_or("SERVER_PORT", defaults.server_port),
            report_interval: env_or("REPORT_INTERVAL", defaults.report_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            report_interval: 60,
        }
    }
}

/// Returns `capacity` unless it is zero, in which case the default capacity.
pub fn checked_capacity(capacity: u64) -> u64 {
    if capacity > 0 {
        capacity
    } else {
        warn!("Cache capacity of 0 bytes is not usable, using {}", DEFAULT_CAPACITY);
        DEFAULT_CAPACITY
    }
}

/// Returns `ratio` if it lies in (0, 1], otherwise the default ratio.
pub fn checked_threshold(ratio: f64) -> f64 {
    if ratio > 0.0 && ratio <= 1.0 {
        ratio
    } else {
        warn!(
            "Eviction threshold {} is outside (0, 1], using {}",
            ratio, DEFAULT_THRESHOLD_RATIO
        );
        DEFAULT_THRESHOLD_RATIO
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
