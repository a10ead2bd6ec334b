//! Engine configuration.

use crate::index::btree::DEFAULT_BTREE_ORDER;
use crate::index::hash::DEFAULT_HASH_CAPACITY;
use crate::storage::PageLayout;
use anyhow::{bail, Result};

/// Default number of pages held in the page cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Configuration for a `Database`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Page size and slot directory size.
    pub layout: PageLayout,
    /// Number of pages resident in the cache.
    pub cache_capacity: usize,
    /// Number of slots in the hash index.
    pub hash_capacity: usize,
    /// Maximum number of keys per B+Tree node.
    pub btree_order: usize,
    /// Column read as the index key when building indexes.
    pub key_column: usize,
    /// Column read as the index value when building indexes.
    pub value_column: usize,
}

impl EngineConfig {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Sets the page cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Sets the number of hash index slots.
    pub fn with_hash_capacity(mut self, capacity: usize) -> Self {
        self.hash_capacity = capacity;
        self
    }

    /// Sets the B+Tree order.
    pub fn with_btree_order(mut self, order: usize) -> Self {
        self.btree_order = order;
        self
    }

    /// Sets the key and value columns used by `build_indexes`.
    pub fn with_index_columns(mut self, key_column: usize, value_column: usize) -> Self {
        self.key_column = key_column;
        self.value_column = value_column;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            bail!("Cache capacity must be at least 1");
        }
        if self.hash_capacity == 0 {
            bail!("Hash index capacity must be at least 1");
        }
        if self.btree_order < 2 {
            bail!("B+Tree order must be at least 2, got {}", self.btree_order);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: PageLayout::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            hash_capacity: DEFAULT_HASH_CAPACITY,
            btree_order: DEFAULT_BTREE_ORDER,
            key_column: 0,
            value_column: 1,
        }
    }
}
