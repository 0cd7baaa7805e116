//! Capacity-bounded least-recently-used cache.
//!
//! Used for loaded custom models, which are expensive to load and too large
//! to keep without bound in a long-running process. Recency is the insertion
//! order of the backing [`IndexMap`]: a hit moves the entry to the back, and
//! eviction pops from the front.

use std::hash::Hash;

use indexmap::IndexMap;

/// Default number of entries kept when no capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// LRU cache with a fixed maximum number of entries.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> BoundedCache<K, V> {
    /// Create an empty cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up an entry and mark it most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let value = self.entries.shift_remove(key)?;
        self.entries.insert(key.clone(), value.clone());
        Some(value)
    }

    /// Insert or replace an entry, returning the evicted `(key, value)` if the
    /// cache was full.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.entries.shift_remove(&key).is_some() {
            self.entries.insert(key, value);
            return None;
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0)
        } else {
            None
        };
        self.entries.insert(key, value);
        evicted
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let cache: BoundedCache<u32, u32> = BoundedCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn evicts_least_recently_inserted() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.insert("c", 3), Some(("a", 1)));
        assert!(!cache.contains(&"a"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.insert("c", 3), Some(("b", 2)));
        assert!(cache.contains(&"a"));
    }

    #[test]
    fn replacing_a_key_does_not_evict() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.insert("a", 10), None);
        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn remove_drops_entry() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        assert_eq!(cache.remove(&"a"), Some(1));
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }
}
