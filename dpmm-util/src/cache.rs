use fnv::FnvHashMap as HashMap;
use std::collections::VecDeque;
use std::hash::Hash;

pub const DEFAULT_CACHE_SIZE: usize = 10_000;

/// Bounded memo table with oldest-inserted-first eviction.
///
/// Deliberately FIFO rather than LRU: re-accessing an entry does not
/// refresh its age, so a long run cannot pin stale hot keys forever.
pub struct FifoCache<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> FifoCache<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::default(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert a key/value pair, evicting the oldest entry once the
    /// bound is exceeded. Re-inserting an existing key replaces the
    /// value without changing its position in the eviction queue.
    pub fn insert(&mut self, key: K, value: V) {
        if self.map.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }

        if self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K: Hash + Eq + Clone, V> Default for FifoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
