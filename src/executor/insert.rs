//! Insert executor implementation.

use crate::access::{Record, RecordId, Value};
use crate::executor::{ExecutionContext, Executor, Row};
use crate::storage::{PageId, StorageError};
use anyhow::{bail, Result};
use log::{debug, warn};

/// Executor that places one record into the first page with room for it,
/// appending a page when none has any. The page is written through after
/// the placement.
///
/// Each `open()` allows one placement. The output row is
/// `[page_id, slot_id]` of the stored record.
pub struct InsertExecutor {
    record: Record,
    context: ExecutionContext,
    placed: Option<RecordId>,
    output: Row,
    done: bool,
    initialized: bool,
}

impl InsertExecutor {
    pub fn new(record: Record, context: ExecutionContext) -> Self {
        Self {
            record,
            context,
            placed: None,
            output: Vec::new(),
            done: false,
            initialized: false,
        }
    }

    /// Location of the record after a successful `next()`.
    pub fn placed(&self) -> Option<RecordId> {
        self.placed
    }

    fn place(&mut self) -> Result<Option<RecordId>> {
        let mut cache = self.context.cache.lock();

        let size = self.record.serialized_size();
        let capacity = cache.layout().data_capacity();
        if size > capacity {
            return Err(StorageError::RecordTooLarge { size, capacity }.into());
        }

        for index in 0..cache.page_count() {
            let page_id = PageId(index as u32);
            let page = cache.get(page_id)?;
            if page.can_fit(size) {
                let slot_id = page.add_record(&self.record)?;
                cache.flush(page_id)?;
                return Ok(Some(RecordId::new(page_id, slot_id)));
            }
        }

        let page_id = cache.extend()?;
        debug!("No page had room for {} bytes, extended to {}", size, page_id);
        match cache.get(page_id)?.add_record(&self.record) {
            Ok(slot_id) => {
                cache.flush(page_id)?;
                Ok(Some(RecordId::new(page_id, slot_id)))
            }
            Err(StorageError::PageFull { required, available }) => {
                warn!(
                    "Fresh page {} rejected a record of {} bytes ({} available)",
                    page_id, required, available
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Executor for InsertExecutor {
    fn open(&mut self) -> Result<()> {
        self.placed = None;
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

        match self.place()? {
            Some(record_id) => {
                self.placed = Some(record_id);
                self.output = vec![
                    Value::Int32(record_id.page_id.0 as i32),
                    Value::Int32(record_id.slot_id as i32),
                ];
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.initialized = false;
        Ok(())
    }

    fn output(&self) -> &[Value] {
        &self.output
    }
}
