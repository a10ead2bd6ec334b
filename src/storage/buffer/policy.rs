use crate::storage::page::PageId;
use std::fmt::Debug;

/// Recency tracking used by the page cache to choose a victim.
pub trait EvictionPolicy: Send + Debug {
    /// Record an access to `page_id`, making it the most recently used.
    /// Returns whether the page was already tracked. When the tracked set is
    /// full and `page_id` is new, the least recently used page is dropped
    /// first.
    fn touch(&mut self, page_id: PageId) -> bool;

    /// Remove and return the least recently used page, or `None` if nothing
    /// is tracked.
    fn evict(&mut self) -> Option<PageId>;

    /// Number of tracked pages.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
