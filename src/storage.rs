//! Storage layer implementation for pagedb.
//!
//! This module provides page-based persistence. Key components:
//!
//! - **SlottedPage**: Fixed-size block with a slot directory and packed record data
//! - **PageStore**: Append-only file of pages; the only code that touches the disk
//! - **PageCache**: Bounded in-memory set of pages with pluggable eviction (LRU)
//!
//! There is no write-ahead log. Pages reach disk when they are evicted or
//! flushed explicitly, and each write is synchronous.

pub mod buffer;
pub mod disk;
pub mod error;
pub mod page;

pub use buffer::lru::LruPolicy;
pub use buffer::policy::EvictionPolicy;
pub use buffer::{CacheStats, PageCache};
pub use disk::PageStore;
pub use error::{StorageError, StorageResult};
pub use page::{PageId, PageLayout, SlotId, SlottedPage};
