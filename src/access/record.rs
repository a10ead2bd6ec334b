use crate::access::value::{Value, ValueError};
use crate::storage::page::{PageId, SlotId};
use bytes::{Buf, BufMut};
use std::cmp::Ordering;
use std::fmt;

/// Size of the per-record header (field count).
pub const RECORD_HEADER_SIZE: usize = 2;

/// Location of a record: the page it lives in and its slot within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.page_id.0.cmp(&other.page_id.0) {
            Ordering::Equal => self.slot_id.cmp(&other.slot_id),
            other => other,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id.0, self.slot_id)
    }
}

/// An ordered list of values, serialized and stored as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Size in bytes of the serialized form.
    pub fn serialized_size(&self) -> usize {
        RECORD_HEADER_SIZE + self.values.iter().map(Value::encoded_size).sum::<usize>()
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ValueError> {
        let count = u16::try_from(self.values.len())
            .map_err(|_| ValueError::Encode(format!("too many fields: {}", self.values.len())))?;

        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.put_u16_le(count);
        for value in &self.values {
            value.encode(&mut buf)?;
        }
        Ok(buf)
    }

    /// Decode a record from the front of `data`. Bytes after the last field
    /// are ignored.
    pub fn deserialize(data: &[u8]) -> Result<Self, ValueError> {
        let mut buf = data;
        if buf.remaining() < RECORD_HEADER_SIZE {
            return Err(ValueError::Decode("truncated record header".to_string()));
        }
        let count = buf.get_u16_le() as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(Value::decode(&mut buf)?);
        }
        Ok(Self { values })
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}
