//! In-memory indexes built from a full scan of the page store.
//!
//! Both indexes map an integer key to an integer value and use accumulator
//! semantics: inserting an existing key adds the new value to the stored one.
//!
//! - **HashIndex**: Fixed-capacity open-addressed table for point lookups and
//!   group sums
//! - **BPlusTree / OrderedIndex**: Sorted map with a linked leaf chain for
//!   range scans

pub mod btree;
pub mod hash;

pub use btree::{BPlusTree, OrderedIndex};
pub use hash::HashIndex;

use thiserror::Error;

/// Errors raised by index maintenance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Hash index is full: no slot for key {key} (capacity {capacity})")]
    Full { key: i64, capacity: usize },

    #[error("Invalid B+Tree order {0}: must be at least 2")]
    InvalidOrder(usize),

    #[error("Hash index capacity must be non-zero")]
    ZeroCapacity,
}

/// Combine a value into an existing accumulator.
pub trait Accumulate {
    fn accumulate(&mut self, other: Self);
}

macro_rules! impl_wrapping_accumulate {
    ($($t:ty),*) => {
        $(
            impl Accumulate for $t {
                fn accumulate(&mut self, other: Self) {
                    *self = self.wrapping_add(other);
                }
            }
        )*
    };
}

impl_wrapping_accumulate!(i32, i64, u32, u64);

impl Accumulate for f32 {
    fn accumulate(&mut self, other: Self) {
        *self += other;
    }
}

impl Accumulate for f64 {
    fn accumulate(&mut self, other: Self) {
        *self += other;
    }
}
