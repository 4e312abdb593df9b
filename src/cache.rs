//! Computed table: a direct-mapped memo cache for recursive operators.
//!
//! The table has `2^bits` slots. A key is hashed to one slot; inserting into an
//! occupied slot overwrites the previous entry. The full key is stored and
//! compared on lookup, so a collision is always a miss and never a wrong hit.

use std::cell::Cell;

use crate::edge::Edge;
use crate::types::NodeId;
use crate::utils::{mix64, pairing2, pairing3, MyHash};

struct Entry<K, V> {
    key: K,
    value: V,
}

pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new table of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        let bitmask = (size - 1) as u64;

        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Get the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    /// Get the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }
    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.data.iter().filter(|entry| entry.is_some()).count()
    }
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|entry| entry.is_none())
    }

    /// Reset the cache.
    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }

    fn index(&self, key: u64) -> usize {
        (key & self.bitmask) as usize
    }

    /// Get the cached result.
    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: MyHash + Eq,
    {
        let index = self.index(key.hash());
        match &self.data[index] {
            Some(entry) if entry.key == *key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Insert a result into the cache, evicting whatever occupied the slot.
    pub fn insert(&mut self, key: K, value: V)
    where
        K: MyHash,
    {
        let index = self.index(key.hash());
        self.data[index] = Some(Entry { key, value });
    }
}

/// Operation tag plus operand identities.
///
/// `Add` keys on full edges (ordered, since addition commutes). The unary
/// operators and `Multiply` key on nodes only: weights are factored out by the
/// caller and multiplied back into the cached result.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpKey {
    Add(Edge, Edge),
    Multiply(NodeId, NodeId),
    Transpose(NodeId),
    ConjugateTranspose(NodeId),
}

impl OpKey {
    /// Key for `a + b`, identical for `b + a`.
    pub fn add(a: Edge, b: Edge) -> Self {
        if a <= b {
            OpKey::Add(a, b)
        } else {
            OpKey::Add(b, a)
        }
    }
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        let raw = match self {
            OpKey::Add(a, b) => pairing3(0, MyHash::hash(a), MyHash::hash(b)),
            OpKey::Multiply(a, b) => pairing3(1, a.raw() as u64, b.raw() as u64),
            OpKey::Transpose(a) => pairing2(2, a.raw() as u64),
            OpKey::ConjugateTranspose(a) => pairing2(3, a.raw() as u64),
        };
        mix64(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplitude::AmpId;

    impl MyHash for u64 {
        fn hash(&self) -> u64 {
            *self
        }
    }

    #[test]
    fn test_cache() {
        let mut cache = Cache::<(u64, u64), i32>::new(3);

        cache.insert((1, 2), 3);
        cache.insert((2, 3), 1);
        cache.insert((1, 3), 2);

        assert_eq!(cache.get(&(1, 2)), Some(&3));
        assert_eq!(cache.get(&(2, 3)), Some(&1));
        assert_eq!(cache.get(&(1, 3)), Some(&2));
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.get(&(3, 2)), None);
        assert_eq!(cache.get(&(1, 1)), None);
        assert_eq!(cache.hits(), 3);
        assert_eq!(cache.misses(), 3);
    }

    #[test]
    fn test_cache_overwrites_on_collision() {
        let mut cache = Cache::<u64, &str>::new(2);
        cache.insert(1, "one");
        // 5 & 0b11 == 1: same slot.
        cache.insert(5, "five");
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&5), Some(&"five"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&5), None);
    }

    #[test]
    fn test_add_key_is_symmetric() {
        let a = Edge::new(NodeId::new(4), AmpId::ONE);
        let b = Edge::new(NodeId::new(2), AmpId::new(3));
        assert_eq!(OpKey::add(a, b), OpKey::add(b, a));
        assert_eq!(MyHash::hash(&OpKey::add(a, b)), MyHash::hash(&OpKey::add(b, a)));
        assert_ne!(OpKey::Multiply(a.node, b.node), OpKey::Multiply(b.node, a.node));
    }
}
