pub mod slotted_page;

use crate::storage::error::{StorageError, StorageResult};
use std::fmt;

pub use slotted_page::SlottedPage;

/// Default page size in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 4096;
/// Default number of entries in a page's slot directory.
pub const DEFAULT_MAX_SLOTS: usize = 512;
/// Encoded size of one slot directory entry: occupied flag + offset + length.
pub const SLOT_ENTRY_SIZE: usize = 5;
/// Sentinel for an offset or length that has never been assigned.
pub const INVALID_OFFSET: u16 = u16::MAX;

pub type SlotId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometry shared by every page of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: usize,
    max_slots: usize,
}

impl PageLayout {
    pub fn new(page_size: usize, max_slots: usize) -> StorageResult<Self> {
        if page_size > INVALID_OFFSET as usize {
            return Err(StorageError::InvalidLayout(format!(
                "page size {} does not fit 16-bit slot offsets",
                page_size
            )));
        }
        if max_slots == 0 || max_slots > INVALID_OFFSET as usize {
            return Err(StorageError::InvalidLayout(format!(
                "max_slots must be in 1..{}, got {}",
                INVALID_OFFSET, max_slots
            )));
        }
        if max_slots * SLOT_ENTRY_SIZE >= page_size {
            return Err(StorageError::InvalidLayout(format!(
                "{} slots leave no data region in a {} byte page",
                max_slots, page_size
            )));
        }
        Ok(Self {
            page_size,
            max_slots,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Size of the slot directory; the data region starts here.
    pub fn metadata_size(&self) -> usize {
        self.max_slots * SLOT_ENTRY_SIZE
    }

    /// Bytes available for serialized records in an empty page. Placement
    /// requires `offset + length < page_size`, hence the extra byte.
    pub fn data_capacity(&self) -> usize {
        self.page_size - self.metadata_size() - 1
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }
}
