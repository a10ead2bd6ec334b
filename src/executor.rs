//! Executor layer for query execution.
//!
//! This module implements the Volcano-style iterator model. Each executor
//! is driven through `open()`, repeated `next()` calls and `close()`; after a
//! `next()` that returned `true`, `output()` exposes the current row.

use crate::access::Value;
use crate::storage::PageCache;
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

pub mod aggregate;
pub mod delete;
pub mod insert;
pub mod scan;
pub mod select;

// Re-export executors
pub use aggregate::{AggregateFunction, AggregateSpec, HashAggregateExecutor};
pub use delete::DeleteExecutor;
pub use insert::InsertExecutor;
pub use scan::ScanExecutor;
pub use select::SelectExecutor;

/// A row flowing between executors
pub type Row = Vec<Value>;

/// Trait for all query executors
pub trait Executor: Send {
    /// Initialize or rewind the executor. This must be called before `next()`.
    fn open(&mut self) -> Result<()>;

    /// Advance to the next output row.
    /// Returns false once the executor is exhausted.
    fn next(&mut self) -> Result<bool>;

    /// Release resources held since `open()`.
    fn close(&mut self) -> Result<()>;

    /// The row made current by the last successful `next()`. Empty before the
    /// first row and after exhaustion.
    fn output(&self) -> &[Value];
}

/// Open `executor`, collect every row it produces and close it.
pub fn collect_rows(executor: &mut dyn Executor) -> Result<Vec<Row>> {
    executor.open()?;
    let mut rows = Vec::new();
    while executor.next()? {
        rows.push(executor.output().to_vec());
    }
    executor.close()?;
    Ok(rows)
}

/// Execution context containing shared resources
#[derive(Clone)]
pub struct ExecutionContext {
    pub cache: Arc<Mutex<PageCache>>,
}

impl ExecutionContext {
    pub fn new(cache: Arc<Mutex<PageCache>>) -> Self {
        Self { cache }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::access::Record;
    use crate::storage::{LruPolicy, PageLayout, PageStore};
    use tempfile::{tempdir, TempDir};

    pub(crate) fn create_test_context(capacity: usize) -> Result<(TempDir, ExecutionContext)> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.db");
        let store = PageStore::create(&file_path, PageLayout::default())?;
        let policy = Box::new(LruPolicy::new(capacity));
        let cache = Arc::new(Mutex::new(PageCache::new(store, policy, capacity)));
        Ok((dir, ExecutionContext::new(cache)))
    }

    /// Executor over a fixed set of rows
    pub(crate) struct MockExecutor {
        rows: Vec<Row>,
        pos: Option<usize>,
        pub(crate) opened: usize,
        pub(crate) closed: usize,
    }

    impl MockExecutor {
        pub(crate) fn new(rows: Vec<Row>) -> Self {
            Self {
                rows,
                pos: None,
                opened: 0,
                closed: 0,
            }
        }
    }

    impl Executor for MockExecutor {
        fn open(&mut self) -> Result<()> {
            self.pos = None;
            self.opened += 1;
            Ok(())
        }

        fn next(&mut self) -> Result<bool> {
            let next = self.pos.map_or(0, |pos| pos + 1);
            self.pos = Some(next.min(self.rows.len()));
            Ok(next < self.rows.len())
        }

        fn close(&mut self) -> Result<()> {
            self.closed += 1;
            Ok(())
        }

        fn output(&self) -> &[Value] {
            match self.pos {
                Some(pos) if pos < self.rows.len() => &self.rows[pos],
                _ => &[],
            }
        }
    }

    pub(crate) fn int_rows(rows: &[&[i32]]) -> Vec<Row> {
        rows.iter()
            .map(|row| row.iter().map(|v| Value::Int32(*v)).collect())
            .collect()
    }

    #[test]
    fn test_mock_executor() -> Result<()> {
        let mut mock = MockExecutor::new(int_rows(&[&[1], &[2]]));
        assert_eq!(collect_rows(&mut mock)?, int_rows(&[&[1], &[2]]));
        assert!(mock.output().is_empty());

        // Reopening rewinds
        assert_eq!(collect_rows(&mut mock)?.len(), 2);
        assert_eq!(mock.opened, 2);
        Ok(())
    }

    #[test]
    fn test_execution_context_shares_cache() -> Result<()> {
        let (_dir, context) = create_test_context(4)?;
        let other = context.clone();

        context
            .cache
            .lock()
            .get(crate::storage::PageId(0))?
            .add_record(&Record::new(vec![Value::Int32(1)]))?;

        assert_eq!(other.cache.lock().get(crate::storage::PageId(0))?.occupied_count(), 1);
        Ok(())
    }
}
