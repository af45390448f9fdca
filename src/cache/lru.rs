//! Recency Index Module
//!
//! Implements the key-to-entry map ordered by most recent access that drives LRU eviction.

use std::collections::HashMap;

use crate::error::{CacheError, Result};

/// Sentinel for "no neighbour" links.
const NIL: usize = usize::MAX;

/// A slot in the node arena. `prev` points towards the most recently used
/// end, `next` towards the least recently used end.
#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: usize,
    next: usize,
}

// == Recency Index ==
/// Key-to-entry map that keeps a strict total order by last access.
///
/// The order is a doubly-linked list threaded through an arena of slots,
/// with a `HashMap` from key to slot, so lookup, touch, insert and removal
/// are all O(1) amortized:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Vacated slots are recycled through a free list.
#[derive(Debug)]
pub struct RecencyIndex<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    map: HashMap<String, usize>,
    head: usize,
    tail: usize,
    /// Hard cap on the number of entries, if any
    max_entries: Option<usize>,
}

impl<V> Default for RecencyIndex<V> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<V> RecencyIndex<V> {
    // == Constructor ==
    /// Creates a new empty index.
    ///
    /// With `max_entries` set, inserting a new key into a full index drops the
    /// least recently used entry. `Some(0)` is treated as unbounded.
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            map: HashMap::new(),
            head: NIL,
            tail: NIL,
            max_entries: max_entries.filter(|&max| max > 0),
        }
    }

    // == Exists ==
    /// Checks whether a key is present without changing its position.
    pub fn exists(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    // == Get ==
    /// Returns the entry for `key` and marks it as most recently used.
    pub fn get(&mut self, key: &str) -> Result<&mut V> {
        let idx = *self
            .map
            .get(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        self.touch(idx);
        Ok(&mut self.node_mut(idx).value)
    }

    // == Peek ==
    /// Returns the entry for `key` without touching it.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.map.get(key).map(|&idx| &self.node(idx).value)
    }

    // == Put ==
    /// Stores `value` under `key` at the most recently used end.
    ///
    /// An existing key has its value overwritten and is moved to the front.
    /// If the insert pushes the index over its entry cap, the least recently
    /// used entry is removed and handed back so the owner can account for it.
    pub fn put(&mut self, key: String, value: V) -> Option<(String, V)> {
        if let Some(&idx) = self.map.get(&key) {
            self.node_mut(idx).value = value;
            self.touch(idx);
            return None;
        }

        let idx = self.alloc(Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        self.map.insert(key, idx);
        self.push_front(idx);

        match self.max_entries {
            Some(max) if self.map.len() > max => self.pop_oldest(),
            _ => None,
        }
    }

    // == Erase ==
    /// Removes `key` and returns its entry, or `None` if it was not present.
    pub fn erase(&mut self, key: &str) -> Option<V> {
        let idx = self.map.remove(key)?;
        Some(self.release(idx).value)
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently used entry.
    pub fn pop_oldest(&mut self) -> Option<(String, V)> {
        if self.tail == NIL {
            return None;
        }
        let node = self.release(self.tail);
        self.map.remove(&node.key);
        Some((node.key, node.value))
    }

    // == Peek Oldest ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_oldest(&self) -> Option<(&str, &V)> {
        self.iter_lru().next()
    }

    // == Iterate LRU ==
    /// Walks the entries from least to most recently used.
    ///
    /// The iterator borrows the index, so the order it reports cannot change
    /// underneath it. Calling this again restarts from the oldest entry.
    pub fn iter_lru(&self) -> LruIter<'_, V> {
        LruIter {
            index: self,
            cursor: self.tail,
            remaining: self.map.len(),
        }
    }

    // == Length ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the entry cap, if one is set.
    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.map.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn node(&self, idx: usize) -> &Node<V> {
        self.slots[idx]
            .as_ref()
            .unwrap_or_else(|| panic!("recency index links to vacant slot {}", idx))
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        self.slots[idx]
            .as_mut()
            .unwrap_or_else(|| panic!("recency index links to vacant slot {}", idx))
    }

    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Unlinks a slot and returns its node to the caller. The map entry is
    /// the caller's responsibility.
    fn release(&mut self, idx: usize) -> Node<V> {
        self.unlink(idx);
        let node = self.slots[idx]
            .take()
            .unwrap_or_else(|| panic!("recency index released vacant slot {}", idx));
        self.free.push(idx);
        node
    }

    fn touch(&mut self, idx: usize) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };

        if prev == NIL {
            self.head = next;
        } else {
            self.node_mut(prev).next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.node_mut(next).prev = prev;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = NIL;
            node.next = old_head;
        }

        if old_head == NIL {
            self.tail = idx;
        } else {
            self.node_mut(old_head).prev = idx;
        }
        self.head = idx;
    }

    /// Walks the list in both directions and checks it against the map.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut forward = Vec::new();
        let mut cursor = self.head;
        while cursor != NIL {
            let node = self.node(cursor);
            assert_eq!(self.map.get(&node.key), Some(&cursor), "map/list mismatch");
            forward.push(cursor);
            cursor = node.next;
        }
        assert_eq!(forward.len(), self.map.len(), "list length differs from map");

        let backward: Vec<usize> = self.iter_lru().map(|(k, _)| self.map[k]).collect();
        forward.reverse();
        assert_eq!(forward, backward, "prev links disagree with next links");
        assert_eq!(self.slots.len(), self.map.len() + self.free.len());
    }
}

// == LRU Iterator ==
/// Iterator over `(key, entry)` pairs from least to most recently used.
pub struct LruIter<'a, V> {
    index: &'a RecencyIndex<V>,
    cursor: usize,
    remaining: usize,
}

impl<'a, V> Iterator for LruIter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = self.index.node(self.cursor);
        self.cursor = node.prev;
        self.remaining -= 1;
        Some((node.key.as_str(), &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for LruIter<'_, V> {}
