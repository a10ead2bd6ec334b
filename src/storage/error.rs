//! Storage layer error types.

use crate::storage::page::PageId;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Page is full: requires {required} bytes but only {available} available")]
    PageFull { required: usize, available: usize },

    #[error("Invalid slot ID: {slot_id} (max: {max_slots})")]
    InvalidSlotId { slot_id: u16, max_slots: u16 },

    #[error("Record of {size} bytes can never fit in a page with {capacity} bytes of data space")]
    RecordTooLarge { size: usize, capacity: usize },

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Page {0} is not resident in the page cache")]
    PageNotResident(PageId),

    #[error("Invalid page layout: {0}")]
    InvalidLayout(String),

    #[error("Corrupted page data: {0}")]
    Corrupted(String),

    #[error("Short read on page {page_id}: got {read} bytes")]
    ShortRead { page_id: PageId, read: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this error signals a failed read or write against the page
    /// file. Such failures are not retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::ShortRead { .. } | StorageError::Io(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
