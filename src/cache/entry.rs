//! Cache Entry Module
//!
//! Defines the payload size contract and the structure of individual cache entries.

use std::sync::Arc;

use bytes::Bytes;

// == Payload ==
/// An opaque object the cache can account for.
///
/// The cache never looks inside a payload; it only asks for its size once, on
/// insert, and trusts that value until the entry is removed or overwritten.
/// Implementations must therefore report a size that stays stable for the
/// lifetime of the value.
pub trait Payload: Send + Sync {
    /// Returns the size of the payload in bytes.
    fn size(&self) -> u64;
}

impl Payload for Vec<u8> {
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl Payload for Box<[u8]> {
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl Payload for Bytes {
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl Payload for String {
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

// == Cache Entry ==
/// A payload held by the cache together with the size recorded for it.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored payload, shared with callers
    pub payload: Arc<V>,
    /// Size reported by the payload when it was inserted
    pub size: u64,
}

impl<V: Payload> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry, recording the payload's current size.
    pub fn new(payload: Arc<V>) -> Self {
        let size = payload.size();
        Self { payload, size }
    }

    // == Replace ==
    /// Swaps in a new payload and returns the size of the one it replaced.
    pub fn replace(&mut self, payload: Arc<V>) -> u64 {
        let old_size = self.size;
        self.size = payload.size();
        self.payload = payload;
        old_size
    }
}
