pub mod lru;
pub mod policy;

use crate::storage::disk::PageStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageId, PageLayout, SlottedPage};
use log::{debug, warn};
use policy::EvictionPolicy;
use std::collections::HashMap;

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub flushes: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded map of resident pages in front of a `PageStore`.
///
/// This is the only component that performs page I/O. When a miss arrives
/// at capacity, the policy's victim is written back before the requested
/// page is admitted, so a page is never dropped without being flushed.
pub struct PageCache {
    store: PageStore,
    pages: HashMap<PageId, SlottedPage>,
    policy: Box<dyn EvictionPolicy>,
    capacity: usize,
    stats: CacheStats,
}

impl PageCache {
    pub fn new(store: PageStore, policy: Box<dyn EvictionPolicy>, capacity: usize) -> Self {
        Self {
            store,
            pages: HashMap::with_capacity(capacity),
            policy,
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Return the page, loading it from disk on a miss.
    pub fn get(&mut self, page_id: PageId) -> StorageResult<&mut SlottedPage> {
        if self.pages.contains_key(&page_id) {
            self.stats.hits += 1;
            self.policy.touch(page_id);
            return self
                .pages
                .get_mut(&page_id)
                .ok_or(StorageError::PageNotResident(page_id));
        }

        if page_id.0 >= self.store.num_pages() {
            return Err(StorageError::PageNotFound(page_id));
        }

        self.stats.misses += 1;
        if self.pages.len() >= self.capacity {
            self.evict_one()?;
        }

        let page = self.store.load(page_id)?;
        self.policy.touch(page_id);
        debug!("Loaded page {} into cache", page_id);
        Ok(self.pages.entry(page_id).or_insert(page))
    }

    fn evict_one(&mut self) -> StorageResult<()> {
        let Some(victim) = self.policy.evict() else {
            return Ok(());
        };

        match self.pages.remove(&victim) {
            Some(page) => {
                if let Err(e) = self.store.flush(victim, &page) {
                    // Keep the page resident so its contents are not lost
                    self.pages.insert(victim, page);
                    self.policy.touch(victim);
                    return Err(e);
                }
                self.stats.evictions += 1;
                self.stats.flushes += 1;
                debug!("Evicted page {}", victim);
            }
            None => warn!("Eviction policy chose page {} which is not resident", victim),
        }
        Ok(())
    }

    /// Write a resident page through to disk.
    pub fn flush(&mut self, page_id: PageId) -> StorageResult<()> {
        let page = self
            .pages
            .get(&page_id)
            .ok_or(StorageError::PageNotResident(page_id))?;
        self.store.flush(page_id, page)?;
        self.stats.flushes += 1;
        Ok(())
    }

    /// Write every resident page through to disk.
    pub fn flush_all(&mut self) -> StorageResult<()> {
        let mut page_ids: Vec<PageId> = self.pages.keys().copied().collect();
        page_ids.sort();
        for page_id in page_ids {
            self.flush(page_id)?;
        }
        Ok(())
    }

    /// Append a page to the store. The new page is not brought into the cache.
    pub fn extend(&mut self) -> StorageResult<PageId> {
        self.store.extend()
    }

    pub fn page_count(&self) -> usize {
        self.store.num_pages() as usize
    }

    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.pages.contains_key(&page_id)
    }

    pub fn resident_count(&self) -> usize {
        self.pages.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn layout(&self) -> PageLayout {
        self.store.layout()
    }

    /// Read a page image straight from the store, bypassing the cache.
    pub fn load_from_store(&mut self, page_id: PageId) -> StorageResult<SlottedPage> {
        self.store.load(page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Record, Value};
    use anyhow::Result;
    use tempfile::{tempdir, TempDir};

    fn create_test_cache(capacity: usize, pages: u32) -> Result<(TempDir, PageCache)> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.db");
        let mut store = PageStore::create(&file_path, PageLayout::default())?;
        while store.num_pages() < pages {
            store.extend()?;
        }
        let policy = Box::new(lru::LruPolicy::new(capacity));
        Ok((dir, PageCache::new(store, policy, capacity)))
    }

    fn marker(page: u32) -> Record {
        Record::new(vec![Value::Int32(page as i32), Value::from("marker")])
    }

    #[test]
    fn test_get_hit_and_miss() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(4, 2)?;

        cache.get(PageId(0))?;
        cache.get(PageId(0))?;
        cache.get(PageId(1))?;

        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(cache.resident_count(), 2);
        Ok(())
    }

    #[test]
    fn test_eviction_writes_back() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(2, 3)?;

        cache.get(PageId(0))?.add_record(&marker(0))?;
        cache.get(PageId(1))?;
        cache.get(PageId(2))?;

        // Page 0 was least recently used
        assert!(!cache.is_resident(PageId(0)));
        assert_eq!(cache.resident_count(), 2);
        assert_eq!(cache.stats().evictions, 1);

        // Its modification reached the store even though flush was never called
        let on_disk = cache.load_from_store(PageId(0))?;
        assert_eq!(on_disk.read_record(0)?, Some(marker(0)));

        // And reloading through the cache observes it
        assert_eq!(cache.get(PageId(0))?.read_record(0)?, Some(marker(0)));
        Ok(())
    }

    #[test]
    fn test_hit_protects_page_from_eviction() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(2, 3)?;

        cache.get(PageId(0))?;
        cache.get(PageId(1))?;
        cache.get(PageId(0))?;
        cache.get(PageId(2))?;

        assert!(cache.is_resident(PageId(0)));
        assert!(!cache.is_resident(PageId(1)));
        Ok(())
    }

    #[test]
    fn test_capacity_never_exceeded() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(3, 8)?;

        for page in [0, 5, 1, 7, 2, 0, 6, 3, 4, 5, 0, 7] {
            cache.get(PageId(page))?;
            assert!(cache.resident_count() <= cache.capacity());
        }
        Ok(())
    }

    #[test]
    fn test_get_unknown_page() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(1, 1)?;
        cache.get(PageId(0))?;

        assert!(matches!(
            cache.get(PageId(5)),
            Err(StorageError::PageNotFound(PageId(5)))
        ));
        // Nothing was evicted for the failed request
        assert!(cache.is_resident(PageId(0)));
        Ok(())
    }

    #[test]
    fn test_flush_requires_resident_page() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(2, 2)?;

        assert!(matches!(
            cache.flush(PageId(1)),
            Err(StorageError::PageNotResident(PageId(1)))
        ));

        cache.get(PageId(1))?.add_record(&marker(1))?;
        cache.flush(PageId(1))?;
        assert_eq!(
            cache.load_from_store(PageId(1))?.read_record(0)?,
            Some(marker(1))
        );
        Ok(())
    }

    #[test]
    fn test_flush_all() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(4, 3)?;
        for page in 0..3 {
            cache.get(PageId(page))?.add_record(&marker(page))?;
        }

        cache.flush_all()?;
        for page in 0..3 {
            assert_eq!(
                cache.load_from_store(PageId(page))?.read_record(0)?,
                Some(marker(page))
            );
        }
        Ok(())
    }

    #[test]
    fn test_extend_does_not_cache() -> Result<()> {
        let (_dir, mut cache) = create_test_cache(2, 1)?;

        let page_id = cache.extend()?;
        assert_eq!(page_id, PageId(1));
        assert_eq!(cache.page_count(), 2);
        assert!(!cache.is_resident(page_id));
        assert_eq!(cache.get(page_id)?.occupied_count(), 0);
        Ok(())
    }
}
