//! Cache Store Module
//!
//! Size-bounded cache engine: the recency index plus usage accounting and eviction.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Payload, RecencyIndex};
use crate::config::{checked_capacity, checked_threshold, CacheConfig, DEFAULT_THRESHOLD_RATIO};
use crate::error::{CacheError, Result};

/// Everything that has to change together when an entry comes or goes.
struct CacheState<V> {
    lru: RecencyIndex<CacheEntry<V>>,
    /// Sum of the sizes of all entries in `lru`
    usage: u64,
    capacity: u64,
    stats: CacheStats,
}

impl<V> CacheState<V> {
    fn charge(&mut self, size: u64) {
        self.usage += size;
    }

    fn release(&mut self, size: u64) {
        self.usage = self.usage.checked_sub(size).unwrap_or_else(|| {
            panic!(
                "cache usage underflow: releasing {} bytes from usage of {}",
                size, self.usage
            )
        });
    }

    fn over_capacity(&self) -> bool {
        self.usage > self.capacity
    }
}

// == Cache ==
/// Thread-safe, size-bounded LRU cache.
///
/// Entries carry a payload and the byte size it reported on insert. Once the
/// summed size goes above `capacity`, the least recently used entries are
/// evicted until usage is back at `capacity * threshold_ratio`.
///
/// The recency index and the usage counter sit behind a single mutex, so
/// every index mutation and its accounting update are applied together.
/// Eviction picks its victims under one critical section and removes them
/// one by one under their own, so other callers are never blocked for the
/// whole pass.
pub struct Cache<V> {
    state: Mutex<CacheState<V>>,
    threshold_ratio: f64,
}

impl<V: Payload> Cache<V> {
    // == Constructor ==
    /// Creates a new cache with the default eviction threshold of 0.85.
    ///
    /// # Arguments
    /// * `capacity` - Soft limit on the summed payload size, in bytes
    /// * `max_entries` - Optional hard cap on the number of entries
    pub fn new(capacity: u64, max_entries: Option<usize>) -> Self {
        Self::with_threshold_ratio(capacity, max_entries, DEFAULT_THRESHOLD_RATIO)
    }

    /// Creates a new cache that frees down to `capacity * threshold_ratio` on eviction.
    ///
    /// A ratio outside (0, 1] and a capacity of zero are replaced by their defaults.
    pub fn with_threshold_ratio(
        capacity: u64,
        max_entries: Option<usize>,
        threshold_ratio: f64,
    ) -> Self {
        let capacity = checked_capacity(capacity);
        let threshold_ratio = checked_threshold(threshold_ratio);
        debug!(
            "Construct cache with capacity {} bytes, max entries {:?}, threshold ratio {}",
            capacity, max_entries, threshold_ratio
        );

        Self {
            state: Mutex::new(CacheState {
                lru: RecencyIndex::new(max_entries),
                usage: 0,
                capacity,
                stats: CacheStats::new(),
            }),
            threshold_ratio,
        }
    }

    /// Creates a new cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_threshold_ratio(config.capacity, config.max_entries, config.threshold_ratio)
    }

    // == Set Capacity ==
    /// Replaces the capacity and evicts right away if usage is now above it.
    ///
    /// A capacity of zero is ignored.
    pub fn set_capacity(&self, capacity: u64) {
        if capacity == 0 {
            debug!("Ignoring cache capacity of 0 bytes");
            return;
        }

        self.state.lock().capacity = capacity;
        self.free_memory();
    }

    // == Size ==
    /// Returns the current number of entries in the cache.
    pub fn size(&self) -> usize {
        self.state.lock().lru.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Exists ==
    /// Checks whether `key` is cached without touching it.
    pub fn exists(&self, key: &str) -> bool {
        self.state.lock().lru.exists(key)
    }

    // == Get ==
    /// Returns the payload stored under `key`, marking it as most recently used.
    ///
    /// Returns `None` if the key is not cached.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.lru.exists(key) {
            state.stats.record_miss();
            return None;
        }

        let payload = state.lru.get(key).ok().map(|entry| entry.payload.clone());
        state.stats.record_hit();
        payload
    }

    // == Insert ==
    /// Stores `payload` under `key`.
    ///
    /// An existing entry is overwritten in place and usage moves by the size
    /// difference; either way the key becomes the most recently used. If the
    /// cache ends up above capacity, eviction runs after the lock is released.
    ///
    /// # Errors
    /// `CacheError::EntryTooLarge` if the payload alone exceeds the capacity.
    /// The cache is left untouched in that case.
    pub fn insert(&self, key: impl Into<String>, payload: Arc<V>) -> Result<()> {
        let key = key.into();
        let size = payload.size();

        let over_capacity = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            if size > state.capacity {
                return Err(CacheError::EntryTooLarge {
                    key,
                    size,
                    capacity: state.capacity,
                });
            }

            if state.lru.exists(&key) {
                // key already exists, over-write old data
                let old_size = state
                    .lru
                    .get(&key)
                    .unwrap_or_else(|_| panic!("cache index lost key {} under lock", key))
                    .replace(payload);
                state.release(old_size);
                state.charge(size);
            } else {
                state.charge(size);
                let displaced = state.lru.put(key.clone(), CacheEntry::new(payload));
                if let Some((dropped, entry)) = displaced {
                    state.release(entry.size);
                    state.stats.record_eviction();
                    debug!(
                        "Entry cap reached, dropped {} ({} bytes) from cache",
                        dropped, entry.size
                    );
                }
            }

            debug!(
                "Insert {} size: {} bytes into cache, usage: {} bytes",
                key, size, state.usage
            );
            state.over_capacity()
        };

        if over_capacity {
            self.free_memory();
        }
        Ok(())
    }

    // == Erase ==
    /// Removes `key` from the cache. Returns whether anything was removed.
    pub fn erase(&self, key: &str) -> bool {
        self.remove(key, false)
    }

    // == Clear ==
    /// Removes every entry and resets usage to zero. Returns the number of
    /// entries dropped.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let removed = state.lru.len();
        state.lru.clear();
        state.usage = 0;
        debug!("Clear cache, dropped {} entries", removed);
        removed
    }

    // == Free Memory ==
    /// Evicts least recently used entries while usage is above capacity.
    ///
    /// Frees down to `floor(capacity * threshold_ratio)`. Victims are chosen
    /// from the LRU end in one pass, then removed individually; a victim that
    /// has already disappeared in between is skipped. Returns the number of
    /// entries removed.
    pub fn free_memory(&self) -> usize {
        let release_set = {
            let state = self.state.lock();
            if !state.over_capacity() {
                return 0;
            }

            let threshold = (state.capacity as f64 * self.threshold_ratio).floor() as u64;
            let delta = state.usage - threshold;
            debug!(
                "Current usage {} exceeds cache capacity {}, start free memory",
                state.usage, state.capacity
            );

            let mut keys = BTreeSet::new();
            let mut released: u64 = 0;
            for (key, entry) in state.lru.iter_lru() {
                if released >= delta {
                    break;
                }
                if keys.insert(key.to_string()) {
                    released += entry.size;
                }
            }

            debug!("To be released memory size: {}", released);
            keys
        };

        let evicted = release_set
            .iter()
            .filter(|key| self.remove(key, true))
            .count();

        self.log_state();
        evicted
    }

    // == Accessors ==
    /// Bytes occupied by live entries.
    pub fn usage(&self) -> u64 {
        self.state.lock().usage
    }

    pub fn capacity(&self) -> u64 {
        self.state.lock().capacity
    }

    pub fn threshold_ratio(&self) -> f64 {
        self.threshold_ratio
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.state.lock().lru.max_entries()
    }

    // == Stats ==
    /// Returns a consistent snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            total_entries: state.lru.len(),
            usage: state.usage,
            capacity: state.capacity,
            ..state.stats.clone()
        }
    }

    // == Log State ==
    /// Logs entry count, usage and capacity at debug level.
    pub fn log_state(&self) {
        let stats = self.stats();
        debug!("[Cache item count]: {}", stats.total_entries);
        debug!("[Cache usage]: {} bytes", stats.usage);
        debug!("[Cache capacity]: {} bytes", stats.capacity);
    }

    fn remove(&self, key: &str, evicted: bool) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(entry) = state.lru.erase(key) else {
            if evicted {
                debug!("Eviction candidate {} was already removed", key);
            }
            return false;
        };

        state.release(entry.size);
        if evicted {
            state.stats.record_eviction();
            debug!("Evict {} ({} bytes) from cache", key, entry.size);
        } else {
            debug!("Erase {} from cache", key);
        }
        true
    }

    /// Checks that `usage` matches the summed entry sizes and the index is well formed.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let state = self.state.lock();
        state.lru.assert_consistent();
        let actual: u64 = state.lru.iter_lru().map(|(_, entry)| entry.size).sum();
        assert_eq!(state.usage, actual, "usage drifted from entry sizes");
    }

    /// Keys from least to most recently used.
    #[cfg(test)]
    pub(crate) fn lru_keys(&self) -> Vec<String> {
        let state = self.state.lock();
        state.lru.iter_lru().map(|(key, _)| key.to_string()).collect()
    }
}
