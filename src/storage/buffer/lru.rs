use super::policy::EvictionPolicy;
use crate::storage::page::PageId;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
pub struct LruPolicy {
    /// Access stamp -> page, least recently used first
    order: BTreeMap<u64, PageId>,
    /// Page -> its latest access stamp
    stamps: HashMap<PageId, u64>,
    /// Monotonic access counter
    clock: u64,
    /// Maximum number of tracked pages
    capacity: usize,
}

impl LruPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: BTreeMap::new(),
            stamps: HashMap::with_capacity(capacity),
            clock: 0,
            capacity,
        }
    }
}

impl EvictionPolicy for LruPolicy {
    fn touch(&mut self, page_id: PageId) -> bool {
        let found = match self.stamps.remove(&page_id) {
            Some(stamp) => {
                self.order.remove(&stamp);
                true
            }
            None => false,
        };

        if self.order.len() >= self.capacity {
            self.evict();
        }

        if self.order.len() < self.capacity {
            self.clock += 1;
            self.order.insert(self.clock, page_id);
            self.stamps.insert(page_id, self.clock);
        }

        found
    }

    fn evict(&mut self) -> Option<PageId> {
        let (_, page_id) = self.order.pop_first()?;
        self.stamps.remove(&page_id);
        Some(page_id)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_lru_operations() {
        let mut policy = LruPolicy::new(3);

        assert!(policy.is_empty());
        assert_eq!(policy.evict(), None);

        assert!(!policy.touch(PageId(1)));
        assert!(!policy.touch(PageId(2)));
        assert!(!policy.touch(PageId(3)));
        assert_eq!(policy.len(), 3);

        assert_eq!(policy.evict(), Some(PageId(1)));
        assert_eq!(policy.evict(), Some(PageId(2)));
        assert_eq!(policy.evict(), Some(PageId(3)));
        assert_eq!(policy.evict(), None);
    }

    #[test]
    fn test_touch_promotes() {
        let mut policy = LruPolicy::new(3);
        policy.touch(PageId(1));
        policy.touch(PageId(2));
        policy.touch(PageId(3));

        // Page 1 becomes most recently used
        assert!(policy.touch(PageId(1)));
        assert_eq!(policy.len(), 3);

        assert_eq!(policy.evict(), Some(PageId(2)));
        assert_eq!(policy.evict(), Some(PageId(3)));
        assert_eq!(policy.evict(), Some(PageId(1)));
    }

    #[test]
    fn test_touch_at_capacity_drops_lru() {
        let mut policy = LruPolicy::new(2);
        policy.touch(PageId(1));
        policy.touch(PageId(2));

        // Tracking a third page pushes out page 1
        assert!(!policy.touch(PageId(3)));
        assert_eq!(policy.len(), 2);
        assert_eq!(policy.evict(), Some(PageId(2)));
        assert_eq!(policy.evict(), Some(PageId(3)));
    }

    #[test]
    fn test_retouch_at_capacity_keeps_others() {
        let mut policy = LruPolicy::new(2);
        policy.touch(PageId(1));
        policy.touch(PageId(2));

        assert!(policy.touch(PageId(2)));
        assert_eq!(policy.len(), 2);
        assert_eq!(policy.evict(), Some(PageId(1)));
    }
}
