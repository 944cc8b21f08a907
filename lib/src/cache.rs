//! A fixed-capacity least-recently-used cache.

use std::{borrow::Borrow, collections::HashMap, hash::Hash, mem};

/// A node in the recency list.
#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    /// The next more recently used node.
    prev: Option<usize>,
    /// The next less recently used node.
    next: Option<usize>,
}

/// A least-recently-used cache with a fixed capacity.
///
/// Entries live in an arena and are linked into a recency list by index.
/// Lookups go through a hash index, so [`get`](LruCache::get) and
/// [`put`](LruCache::put) take constant time.
///
/// ```
/// use cagen_lib::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.put("c", 3), Some(("a", 1)));
/// assert_eq!(cache.get(&"a"), None);
/// ```
#[derive(Clone, Debug)]
pub struct LruCache<K, V> {
    index: HashMap<K, usize>,
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    /// The most recently used node.
    head: Option<usize>,
    /// The least recently used node.
    tail: Option<usize>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates an empty cache that holds at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        LruCache {
            index: HashMap::with_capacity(capacity.min(1 << 16)),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// The maximal number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether the key is in the cache. Does not change the recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Looks up a value and marks it as the most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = *self.index.get(key)?;
        self.touch(i);
        self.nodes[i].as_ref().map(|node| &node.value)
    }

    /// Looks up a value mutably and marks it as the most recently used.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = *self.index.get(key)?;
        self.touch(i);
        self.nodes[i].as_mut().map(|node| &mut node.value)
    }

    /// Looks up a value without changing the recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &i = self.index.get(key)?;
        self.nodes[i].as_ref().map(|node| &node.value)
    }

    /// Inserts a value as the most recently used entry.
    ///
    /// If the key is already present, its value is replaced.
    /// Otherwise, when the cache is full, the least recently used entry
    /// is evicted and returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&i) = self.index.get(&key) {
            if let Some(node) = self.nodes[i].as_mut() {
                node.value = value;
            }
            self.touch(i);
            return None;
        }
        if self.capacity == 0 {
            return Some((key, value));
        }

        let mut evicted = None;
        if self.len() >= self.capacity {
            if let Some(tail) = self.tail {
                evicted = self.remove_node(tail);
            }
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let i = match self.free.pop() {
            Some(i) => {
                self.nodes[i] = Some(node);
                i
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, i);
        self.push_front(i);
        evicted
    }

    /// Removes an entry and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &i = self.index.get(key)?;
        self.remove_node(i).map(|(_, value)| value)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    fn remove_node(&mut self, i: usize) -> Option<(K, V)> {
        self.unlink(i);
        let node = mem::take(&mut self.nodes[i])?;
        self.index.remove(&node.key);
        self.free.push(i);
        Some((node.key, node.value))
    }

    fn touch(&mut self, i: usize) {
        if self.head != Some(i) {
            self.unlink(i);
            self.push_front(i);
        }
    }

    fn unlink(&mut self, i: usize) {
        let (prev, next) = match &self.nodes[i] {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.nodes[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.nodes[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.nodes[i].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    fn push_front(&mut self, i: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[i].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.nodes[h].as_mut() {
                node.prev = Some(i);
            }
        }
        self.head = Some(i);
        if self.tail.is_none() {
            self.tail = Some(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_refreshes_recency() {
        let mut cache = LruCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");
        assert_eq!(cache.get(&1), Some(&"one"));
        assert_eq!(cache.put(3, "three"), Some((2, "two")));
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
    }

    #[test]
    fn peek_keeps_recency() {
        let mut cache = LruCache::new(2);
        cache.put(1, ());
        cache.put(2, ());
        assert_eq!(cache.peek(&1), Some(&()));
        assert_eq!(cache.put(3, ()), Some((1, ())));
    }

    #[test]
    fn remove_reuses_slot() {
        let mut cache = LruCache::new(3);
        cache.put('a', 1);
        cache.put('b', 2);
        assert_eq!(cache.remove(&'a'), Some(1));
        cache.put('c', 3);
        cache.put('d', 4);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.nodes.len(), 3);
        assert_eq!(cache.put('e', 5), Some(('b', 2)));
    }

    #[test]
    fn zero_capacity() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.put(1, 1), Some((1, 1)));
        assert!(cache.is_empty());
    }
}
