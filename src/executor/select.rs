//! Select executor implementation.
//!
//! This executor filters rows from a child executor with a predicate tree,
//! producing one matching row per `next()` call.

use crate::access::Value;
use crate::executor::Executor;
use crate::expression::Predicate;
use anyhow::{bail, Result};

/// Executor that passes through the child rows satisfying a predicate
pub struct SelectExecutor {
    /// Child executor that produces rows
    child: Box<dyn Executor>,
    predicate: Predicate,
    /// Whether the child's current row is a match
    matched: bool,
    initialized: bool,
}

impl SelectExecutor {
    pub fn new(child: Box<dyn Executor>, predicate: Predicate) -> Self {
        Self {
            child,
            predicate,
            matched: false,
            initialized: false,
        }
    }
}

impl Executor for SelectExecutor {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.matched = false;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if !self.initialized {
            bail!("Executor not initialized. Call open() first.");
        }

        self.matched = false;
        while self.child.next()? {
            if self.predicate.evaluate(self.child.output())? {
                self.matched = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.matched = false;
        self.initialized = false;
        self.child.close()
    }

    fn output(&self) -> &[Value] {
        if self.matched {
            self.child.output()
        } else {
            &[]
        }
    }
}
