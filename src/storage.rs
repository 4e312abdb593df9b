//! Fixed-capacity arena with a free list.
//!
//! Slot 0 is reserved at construction (the terminal node lives there), so
//! [`Storage::alloc`] never hands it out and [`Storage::drop`] refuses it.

#[derive(Debug, Clone)]
pub struct Storage<T>
where
    T: Copy + Default,
{
    data: Vec<T>,
    occupied: Vec<bool>,
    /// Reclaimed slots, reused last-in first-out.
    free: Vec<usize>,
    capacity: usize,
    /// Number of occupied cells, the reserved slot 0 excluded.
    real_size: usize,
}

impl<T> Storage<T>
where
    T: Copy + Default,
{
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");
        assert!(bits >= 1, "Storage needs room for at least one node besides slot 0");

        let capacity = 1 << bits;
        let mut data = Vec::with_capacity(capacity.min(1 << 16));
        data.push(T::default());

        Self {
            data,
            occupied: vec![true], // Set 0th cell as occupied (sentry).
            free: Vec::new(),
            capacity,
            real_size: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Number of cells ever touched (occupied or free), slot 0 included.
    pub fn size(&self) -> usize {
        self.data.len()
    }
    pub fn real_size(&self) -> usize {
        self.real_size
    }
    pub fn is_full(&self) -> bool {
        self.free.is_empty() && self.data.len() >= self.capacity
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        index < self.occupied.len() && self.occupied[index]
    }

    pub fn value(&self, index: usize) -> &T {
        assert!(self.is_occupied(index), "Index {} is not occupied", index);
        &self.data[index]
    }

    pub fn value_mut(&mut self, index: usize) -> &mut T {
        assert!(self.is_occupied(index), "Index {} is not occupied", index);
        &mut self.data[index]
    }

    /// Store `value` in a free cell, or return `None` when the arena is full.
    pub fn add(&mut self, value: T) -> Option<usize> {
        let index = match self.free.pop() {
            Some(index) => {
                self.data[index] = value;
                self.occupied[index] = true;
                index
            }
            None => {
                if self.data.len() >= self.capacity {
                    return None;
                }
                self.data.push(value);
                self.occupied.push(true);
                self.data.len() - 1
            }
        };
        self.real_size += 1;
        Some(index)
    }

    pub fn drop(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        assert!(self.is_occupied(index), "Index {} is not occupied", index);

        self.occupied[index] = false;
        self.data[index] = T::default();
        self.free.push(index);
        self.real_size -= 1;
    }

    /// Iterate over occupied indices, slot 0 excluded.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (1..self.data.len()).filter(move |&i| self.occupied[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_basic() {
        let mut storage = Storage::<u32>::new(3);
        assert_eq!(storage.capacity(), 8);
        assert_eq!(storage.real_size(), 0);

        let a = storage.add(10).unwrap();
        let b = storage.add(20).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(*storage.value(a), 10);
        assert_eq!(storage.real_size(), 2);

        storage.drop(a);
        assert!(!storage.is_occupied(a));
        assert_eq!(storage.real_size(), 1);

        // Freed cells are reused first.
        let c = storage.add(30).unwrap();
        assert_eq!(c, a);
        assert_eq!(*storage.value(c), 30);
        assert_eq!(storage.indices().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_storage_full() {
        let mut storage = Storage::<u32>::new(2);
        assert!(storage.add(1).is_some());
        assert!(storage.add(2).is_some());
        assert!(storage.add(3).is_some());
        assert!(storage.is_full());
        assert!(storage.add(4).is_none());
        storage.drop(2);
        assert!(!storage.is_full());
        assert_eq!(storage.add(5), Some(2));
    }

    #[test]
    #[should_panic(expected = "Index is 0")]
    fn test_drop_sentry() {
        let mut storage = Storage::<u32>::new(2);
        storage.drop(0);
    }
}
