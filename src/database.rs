use crate::access::{Record, RecordId, Value};
use crate::config::EngineConfig;
use crate::executor::{
    collect_rows, DeleteExecutor, ExecutionContext, Executor, InsertExecutor, Row, ScanExecutor,
};
use crate::index::{HashIndex, OrderedIndex};
use crate::planner::{build_operator_tree, QueryPlan};
use crate::storage::{CacheStats, LruPolicy, PageCache, PageId, PageStore, SlotId};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// High-level engine interface that integrates all layers
///
/// Records are stored through the page cache. The hash and ordered indexes
/// are in-memory views rebuilt by `build_indexes` from a full scan; they do
/// not follow later inserts or deletes.
pub struct Database {
    config: EngineConfig,
    cache: Arc<Mutex<PageCache>>,
    hash_index: HashIndex,
    ordered_index: OrderedIndex,
}

impl Database {
    /// Create a new page file at the specified path, truncating any existing one
    pub fn create(path: &Path, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let store = PageStore::create(path, config.layout)
            .with_context(|| format!("Failed to create page file {:?}", path))?;
        Self::with_store(store, config)
    }

    /// Open an existing page file, creating it if missing
    pub fn open(path: &Path, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let store = PageStore::open(path, config.layout)
            .with_context(|| format!("Failed to open page file {:?}", path))?;
        Self::with_store(store, config)
    }

    fn with_store(store: PageStore, config: EngineConfig) -> Result<Self> {
        info!(
            "Engine ready: {} pages, cache capacity {}",
            store.num_pages(),
            config.cache_capacity
        );
        let policy = Box::new(LruPolicy::new(config.cache_capacity));
        let cache = PageCache::new(store, policy, config.cache_capacity);

        Ok(Self {
            config,
            cache: Arc::new(Mutex::new(cache)),
            hash_index: HashIndex::new(config.hash_capacity)?,
            ordered_index: OrderedIndex::new(config.btree_order)?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execution context sharing this engine's page cache
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(Arc::clone(&self.cache))
    }

    /// Store a record in the first page with room, extending the file if needed
    pub fn insert(&mut self, record: Record) -> Result<RecordId> {
        let mut executor = InsertExecutor::new(record, self.context());
        executor.open()?;
        let placed = if executor.next()? {
            executor.placed()
        } else {
            None
        };
        executor.close()?;

        match placed {
            Some(record_id) => Ok(record_id),
            None => bail!("Record rejected by a freshly extended page"),
        }
    }

    /// Store the two-column `[key, value]` record indexes are built from
    pub fn insert_pair(&mut self, key: i32, value: i32) -> Result<RecordId> {
        self.insert(Record::new(vec![Value::Int32(key), Value::Int32(value)]))
    }

    /// Free a slot and write its page through. Returns whether a record was removed.
    pub fn delete(&mut self, page_id: PageId, slot_id: SlotId) -> Result<bool> {
        let mut executor = DeleteExecutor::new(RecordId::new(page_id, slot_id), self.context());
        executor.open()?;
        let deleted = executor.next()? && executor.deleted();
        executor.close()?;
        Ok(deleted)
    }

    /// Rebuild both indexes from a full scan. Rows whose key or value column
    /// is missing or not an integer are skipped. Returns the number of rows
    /// indexed. On error the previously built indexes are kept.
    pub fn build_indexes(&mut self) -> Result<usize> {
        let key_column = self.config.key_column;
        let value_column = self.config.value_column;

        let mut hash_index = HashIndex::new(self.config.hash_capacity)?;
        let mut ordered_index = OrderedIndex::new(self.config.btree_order)?;

        let mut scan = ScanExecutor::new(self.context());
        scan.open()?;
        let mut indexed = 0usize;
        let mut skipped = 0usize;
        while scan.next()? {
            let row = scan.output();
            let key = row.get(key_column).and_then(Value::as_i32);
            let value = row.get(value_column).and_then(Value::as_i32);
            let (Some(key), Some(value)) = (key, value) else {
                skipped += 1;
                continue;
            };

            hash_index
                .insert_or_update(key, value)
                .context("Failed to build hash index")?;
            ordered_index.insert_or_update(key, value);
            indexed += 1;
        }
        scan.close()?;

        if skipped > 0 {
            warn!("Skipped {} rows without integer key/value columns", skipped);
        }
        debug!(
            "Indexed {} rows: {} distinct keys, B+Tree height {}",
            indexed,
            ordered_index.len(),
            ordered_index.height()
        );
        self.hash_index = hash_index;
        self.ordered_index = ordered_index;
        Ok(indexed)
    }

    /// Unopened full scan over every stored record
    pub fn scan(&self) -> Box<dyn Executor> {
        Box::new(ScanExecutor::new(self.context()))
    }

    /// Run a query plan to completion
    pub fn execute(&self, plan: &QueryPlan) -> Result<Vec<Row>> {
        debug!("Executing {}", plan);
        let mut root = build_operator_tree(plan, self.context())?;
        collect_rows(root.as_mut())
    }

    pub fn lookup_hash(&self, key: i32) -> Option<i32> {
        self.hash_index.get(key)
    }

    pub fn lookup_ordered(&self, key: i32) -> Option<i32> {
        self.ordered_index.get(&key).copied()
    }

    /// Values for keys in `[lower, upper]`, in hash slot order
    pub fn range_query_hash(&self, lower: i32, upper: i32) -> Vec<i32> {
        self.hash_index.range_query(lower, upper)
    }

    /// Values for keys in `[lower, upper]`, in ascending key order
    pub fn range_query_ordered(&self, lower: i32, upper: i32) -> Vec<i32> {
        self.ordered_index.range_query(&lower, &upper)
    }

    /// `(key, summed value)` for every indexed key, in hash slot order
    pub fn group_sums(&self) -> Vec<(i32, i32)> {
        self.hash_index.iter().collect()
    }

    pub fn hash_index(&self) -> &HashIndex {
        &self.hash_index
    }

    pub fn ordered_index(&self) -> &OrderedIndex {
        &self.ordered_index
    }

    /// Write every resident page to disk
    pub fn flush(&mut self) -> Result<()> {
        self.cache.lock().flush_all()?;
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.cache.lock().page_count()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Best effort flush on drop
        if let Err(e) = self.flush() {
            warn!("Failed to flush pages on close: {}", e);
        }
    }
}
