//! Delete executor implementation.

use crate::access::{RecordId, Value};
use crate::executor::{ExecutionContext, Executor, Row};
use anyhow::{bail, Result};
use log::debug;

/// Executor that frees one slot and writes its page through to disk
///
/// `next()` returns false when the page does not exist. Otherwise the output
/// row is `[1]` if a record was removed and `[0]` if the slot was already
/// free or out of range.
pub struct DeleteExecutor {
    target: RecordId,
    context: ExecutionContext,
    output: Row,
    done: bool,
    initialized: bool,
}

impl DeleteExecutor {
    pub fn new(target: RecordId, context: ExecutionContext) -> Self {
        Self {
            target,
            context,
            output: Vec::new(),
            done: false,
            initialized: false,
        }
    }

    /// Whether the last `next()` removed a record.
    pub fn deleted(&self) -> bool {
        self.output.first() == Some(&Value::Int32(1))
    }
}

impl Executor for DeleteExecutor {
    fn open(&mut self) -> Result<()> {
        self.output.clear();
        self.done = false;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if !self.initialized {
            bail!("Executor not initialized. Call open() first.");
        }
        if self.done {
            self.output.clear();
            return Ok(false);
        }
        self.done = true;

        let RecordId { page_id, slot_id } = self.target;
        let mut cache = self.context.cache.lock();
        if page_id.0 as usize >= cache.page_count() {
            debug!("Delete of {} skipped: no such page", self.target);
            return Ok(false);
        }

        let deleted = cache.get(page_id)?.delete_record(slot_id);
        if deleted {
            cache.flush(page_id)?;
        }
        self.output = vec![Value::Int32(deleted as i32)];
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.initialized = false;
        Ok(())
    }

    fn output(&self) -> &[Value] {
        &self.output
    }
}
