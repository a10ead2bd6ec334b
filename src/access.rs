//! Access layer for record-oriented data.
//!
//! This module provides the logical row representation used above the
//! storage layer:
//!
//! - **Value**: Typed field values (integer, float, text) with a
//!   length-prefixed binary encoding
//! - **Record**: An ordered list of values, serialized as a unit into a page slot
//! - **RecordId**: The (page, slot) address of a stored record

pub mod record;
pub mod value;

pub use record::{Record, RecordId};
pub use value::{DataType, Value, ValueError};
