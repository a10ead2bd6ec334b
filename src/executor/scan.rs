//! Full scan executor implementation.

use crate::access::Value;
use crate::executor::{ExecutionContext, Executor, Row};
use crate::storage::{PageId, SlotId};
use anyhow::{bail, Result};
use log::debug;

/// Executor that walks every page from page 0 upward, and every slot of a
/// page in ascending order, yielding each occupied record
pub struct ScanExecutor {
    context: ExecutionContext,
    page_index: u32,
    slot_index: usize,
    current: Option<Row>,
    rows_produced: usize,
    initialized: bool,
}

impl ScanExecutor {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            page_index: 0,
            slot_index: 0,
            current: None,
            rows_produced: 0,
            initialized: false,
        }
    }
}

impl Executor for ScanExecutor {
    fn open(&mut self) -> Result<()> {
        self.page_index = 0;
        self.slot_index = 0;
        self.current = None;
        self.rows_produced = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if !self.initialized {
            bail!("Executor not initialized. Call open() first.");
        }

        let mut cache = self.context.cache.lock();
        loop {
            if self.page_index as usize >= cache.page_count() {
                self.current = None;
                return Ok(false);
            }

            let page = cache.get(PageId(self.page_index))?;
            let max_slots = page.layout().max_slots();
            while self.slot_index < max_slots {
                let slot_id = self.slot_index as SlotId;
                self.slot_index += 1;
                if let Some(record) = page.read_record(slot_id)? {
                    self.current = Some(record.into_values());
                    self.rows_produced += 1;
                    return Ok(true);
                }
            }

            self.page_index += 1;
            self.slot_index = 0;
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.initialized {
            debug!(
                "Scan closed after {} rows over {} pages",
                self.rows_produced, self.page_index
            );
        }
        self.current = None;
        self.initialized = false;
        Ok(())
    }

    fn output(&self) -> &[Value] {
        self.current.as_deref().unwrap_or(&[])
    }
}
