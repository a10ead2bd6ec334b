use crate::index::{Accumulate, IndexError};

/// Default number of slots.
pub const DEFAULT_HASH_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HashEntry {
    key: i32,
    value: i32,
}

/// Fixed-capacity open-addressed hash table from key to accumulated value.
///
/// Inserts probe quadratically from `key mod capacity`; lookups probe
/// linearly and stop at the first never-used slot. The two sequences agree
/// for the first two probes only, so a key displaced further by collisions
/// can be missed by `get` while `iter` and `range_query` still see it.
#[derive(Debug, Clone)]
pub struct HashIndex {
    slots: Vec<Option<HashEntry>>,
    len: usize,
}

impl HashIndex {
    pub fn new(capacity: usize) -> Result<Self, IndexError> {
        if capacity == 0 {
            return Err(IndexError::ZeroCapacity);
        }
        Ok(Self {
            slots: vec![None; capacity],
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn home(&self, key: i32) -> usize {
        (key as i64).rem_euclid(self.capacity() as i64) as usize
    }

    /// Insert `key`, or add `value` to its stored value if present.
    pub fn insert_or_update(&mut self, key: i32, value: i32) -> Result<(), IndexError> {
        let capacity = self.capacity();
        let start = self.home(key);
        let mut index = start;
        let mut attempt = 0usize;

        loop {
            match &mut self.slots[index] {
                slot @ None => {
                    *slot = Some(HashEntry { key, value });
                    self.len += 1;
                    return Ok(());
                }
                Some(entry) if entry.key == key => {
                    entry.value.accumulate(value);
                    return Ok(());
                }
                Some(_) => {}
            }

            attempt += 1;
            index = (start + (attempt * attempt) % capacity) % capacity;
            if index == start {
                return Err(IndexError::Full {
                    key: key as i64,
                    capacity,
                });
            }
        }
    }

    pub fn get(&self, key: i32) -> Option<i32> {
        let start = self.home(key);
        let mut index = start;

        loop {
            match self.slots[index] {
                Some(entry) if entry.key == key => return Some(entry.value),
                Some(_) => {}
                None => return None,
            }
            index = (index + 1) % self.capacity();
            if index == start {
                return None;
            }
        }
    }

    /// Values of every key in `[lower, upper]`, in slot order. This is a full
    /// table scan.
    pub fn range_query(&self, lower: i32, upper: i32) -> Vec<i32> {
        self.iter()
            .filter(|(key, _)| (lower..=upper).contains(key))
            .map(|(_, value)| value)
            .collect()
    }

    /// All `(key, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.slots
            .iter()
            .flatten()
            .map(|entry| (entry.key, entry.value))
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self {
            slots: vec![None; DEFAULT_HASH_CAPACITY],
            len: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() -> Result<(), IndexError> {
        let mut index = HashIndex::default();
        index.insert_or_update(7, 70)?;
        index.insert_or_update(42, 420)?;

        assert_eq!(index.get(7), Some(70));
        assert_eq!(index.get(42), Some(420));
        assert_eq!(index.get(8), None);
        assert_eq!(index.len(), 2);
        Ok(())
    }

    #[test]
    fn test_accumulates_values() -> Result<(), IndexError> {
        let mut index = HashIndex::default();
        index.insert_or_update(5, 10)?;
        index.insert_or_update(5, 32)?;

        assert_eq!(index.get(5), Some(42));
        assert_eq!(index.len(), 1);
        Ok(())
    }

    #[test]
    fn test_collision_uses_next_probe() -> Result<(), IndexError> {
        let mut index = HashIndex::new(10)?;
        // 3, 13 and 23 share home slot 3
        index.insert_or_update(3, 1)?;
        index.insert_or_update(13, 2)?;
        index.insert_or_update(13, 2)?;

        assert_eq!(index.get(3), Some(1));
        assert_eq!(index.get(13), Some(4));
        assert_eq!(index.get(23), None);
        Ok(())
    }

    #[test]
    fn test_negative_keys() -> Result<(), IndexError> {
        let mut index = HashIndex::new(10)?;
        index.insert_or_update(-1, 5)?;
        index.insert_or_update(-11, 6)?;

        assert_eq!(index.get(-1), Some(5));
        assert_eq!(index.get(-11), Some(6));
        Ok(())
    }

    #[test]
    fn test_table_full() -> Result<(), IndexError> {
        let mut index = HashIndex::new(4)?;
        for key in 0..4 {
            index.insert_or_update(key, 1)?;
        }

        assert_eq!(
            index.insert_or_update(100, 1),
            Err(IndexError::Full {
                key: 100,
                capacity: 4
            })
        );
        // Existing keys still update
        index.insert_or_update(2, 1)?;
        assert_eq!(index.get(2), Some(2));
        assert_eq!(index.len(), 4);
        Ok(())
    }

    #[test]
    fn test_quadratic_probe_can_report_full_early() -> Result<(), IndexError> {
        // With capacity 5 the probe sequence from slot 0 only visits {0, 1, 4}
        let mut index = HashIndex::new(5)?;
        index.insert_or_update(0, 1)?;
        index.insert_or_update(1, 1)?;
        index.insert_or_update(4, 1)?;

        assert!(index.insert_or_update(5, 1).is_err());
        assert_eq!(index.len(), 3);
        Ok(())
    }

    #[test]
    fn test_range_query() -> Result<(), IndexError> {
        let mut index = HashIndex::default();
        for key in 0..10 {
            index.insert_or_update(key, key * 100)?;
        }

        let mut values = index.range_query(2, 5);
        values.sort();
        assert_eq!(values, vec![200, 300, 400, 500]);
        assert!(index.range_query(50, 60).is_empty());
        Ok(())
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(HashIndex::new(0).unwrap_err(), IndexError::ZeroCapacity);
        assert_eq!(HashIndex::default().capacity(), DEFAULT_HASH_CAPACITY);
    }
}
