use crate::access::Record;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageLayout, SlotId, INVALID_OFFSET, SLOT_ENTRY_SIZE};
use byteorder::{ByteOrder, LittleEndian};

// Slot entry layout (5 bytes)
const OCCUPIED_OFFSET: usize = 0;
const OFFSET_OFFSET: usize = 1;
const LENGTH_OFFSET: usize = 3;

/// One slot directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub occupied: bool,
    pub offset: u16,
    pub length: u16,
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        occupied: false,
        offset: INVALID_OFFSET,
        length: INVALID_OFFSET,
    };

    /// A slot that has never held a record.
    pub fn is_unused(&self) -> bool {
        self.offset == INVALID_OFFSET
    }

    /// Free slots are only reused for records no longer than the space they
    /// were first given.
    fn accepts(&self, size: usize) -> bool {
        !self.occupied && self.length as usize >= size
    }
}

/// A fixed-size page: a slot directory at the front followed by the packed
/// data region.
///
/// Records are placed left-to-right. Deleting a record only clears the
/// slot's occupied flag; its space is never compacted and can be reused only
/// by a record that fits in the slot's recorded length.
#[derive(Debug, Clone)]
pub struct SlottedPage {
    layout: PageLayout,
    data: Box<[u8]>,
}

impl SlottedPage {
    /// Create an empty page with every slot marked unused.
    pub fn new(layout: PageLayout) -> Self {
        let mut page = Self {
            layout,
            data: vec![0u8; layout.page_size()].into_boxed_slice(),
        };
        for slot_id in 0..layout.max_slots() {
            page.write_slot(slot_id, Slot::EMPTY);
        }
        page
    }

    /// Wrap a page image read from disk.
    pub fn from_bytes(layout: PageLayout, data: Vec<u8>) -> StorageResult<Self> {
        if data.len() != layout.page_size() {
            return Err(StorageError::Corrupted(format!(
                "page image is {} bytes, expected {}",
                data.len(),
                layout.page_size()
            )));
        }

        let page = Self {
            layout,
            data: data.into_boxed_slice(),
        };
        for slot_id in 0..layout.max_slots() {
            let slot = page.read_slot(slot_id);
            if slot.occupied && !page.in_bounds(&slot) {
                return Err(StorageError::Corrupted(format!(
                    "slot {} points outside the data region ({}+{})",
                    slot_id, slot.offset, slot.length
                )));
            }
        }
        Ok(page)
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<Slot> {
        let slot_id = slot_id as usize;
        (slot_id < self.layout.max_slots()).then(|| self.read_slot(slot_id))
    }

    /// Serialize `record` into the first eligible slot.
    ///
    /// Fails with `PageFull` without touching the page when the record does
    /// not fit.
    pub fn add_record(&mut self, record: &Record) -> StorageResult<SlotId> {
        let bytes = record
            .serialize()
            .map_err(|_| StorageError::RecordTooLarge {
                size: record.serialized_size(),
                capacity: self.layout.data_capacity(),
            })?;
        let size = bytes.len();

        let (slot_id, offset) =
            self.find_placement(size)
                .ok_or_else(|| StorageError::PageFull {
                    required: size,
                    available: self.free_space(),
                })?;

        let start = offset as usize;
        self.data[start..start + size].copy_from_slice(&bytes);

        let mut slot = self.read_slot(slot_id);
        slot.occupied = true;
        slot.offset = offset;
        if slot.length == INVALID_OFFSET {
            slot.length = size as u16;
        }
        debug_assert!(slot.offset as usize >= self.layout.metadata_size());
        debug_assert!(self.in_bounds(&slot));
        self.write_slot(slot_id, slot);

        Ok(slot_id as SlotId)
    }

    /// Mark a slot free. Returns whether a record was actually removed; free
    /// or out-of-range slots are left alone.
    pub fn delete_record(&mut self, slot_id: SlotId) -> bool {
        match self.slot(slot_id) {
            Some(mut slot) if slot.occupied => {
                slot.occupied = false;
                self.write_slot(slot_id as usize, slot);
                true
            }
            _ => false,
        }
    }

    pub fn read_record(&self, slot_id: SlotId) -> StorageResult<Option<Record>> {
        let slot = self.slot(slot_id).ok_or(StorageError::InvalidSlotId {
            slot_id,
            max_slots: self.layout.max_slots() as u16,
        })?;
        if !slot.occupied {
            return Ok(None);
        }
        debug_assert!(!slot.is_unused(), "occupied slot {} has no offset", slot_id);
        self.decode_slot(slot_id, &slot).map(Some)
    }

    /// Iterate over occupied slots in ascending slot order.
    pub fn iter_occupied(&self) -> impl Iterator<Item = StorageResult<(SlotId, Record)>> + '_ {
        (0..self.layout.max_slots()).filter_map(move |slot_id| {
            let slot = self.read_slot(slot_id);
            if !slot.occupied {
                return None;
            }
            let slot_id = slot_id as SlotId;
            Some(self.decode_slot(slot_id, &slot).map(|record| (slot_id, record)))
        })
    }

    /// Whether a record of `size` serialized bytes would currently be accepted.
    pub fn can_fit(&self, size: usize) -> bool {
        self.find_placement(size).is_some()
    }

    pub fn occupied_count(&self) -> usize {
        (0..self.layout.max_slots())
            .filter(|&slot_id| self.read_slot(slot_id).occupied)
            .count()
    }

    /// Number of slots that have never held a record.
    pub fn unused_slot_count(&self) -> usize {
        (0..self.layout.max_slots())
            .filter(|&slot_id| self.read_slot(slot_id).is_unused())
            .count()
    }

    /// Bytes left after the last allocated slot.
    pub fn free_space(&self) -> usize {
        let end = (0..self.layout.max_slots())
            .map(|slot_id| self.read_slot(slot_id))
            .filter(|slot| !slot.is_unused())
            .map(|slot| slot.offset as usize + slot.length as usize)
            .max()
            .unwrap_or(self.layout.metadata_size());
        (self.layout.page_size() - 1).saturating_sub(end)
    }

    /// First slot that would take a record of `size` bytes, and the offset
    /// the record would be written at.
    fn find_placement(&self, size: usize) -> Option<(usize, u16)> {
        let slot_id = (0..self.layout.max_slots()).find(|&i| self.read_slot(i).accepts(size))?;
        let slot = self.read_slot(slot_id);

        let offset = if !slot.is_unused() {
            slot.offset as usize
        } else if slot_id == 0 {
            self.layout.metadata_size()
        } else {
            let prev = self.read_slot(slot_id - 1);
            debug_assert!(!prev.is_unused(), "slot {} filled out of order", slot_id);
            prev.offset as usize + prev.length as usize
        };

        if offset + size >= self.layout.page_size() {
            return None;
        }
        Some((slot_id, offset as u16))
    }

    fn decode_slot(&self, slot_id: SlotId, slot: &Slot) -> StorageResult<Record> {
        let start = slot.offset as usize;
        let end = start + slot.length as usize;
        Record::deserialize(&self.data[start..end]).map_err(|e| {
            StorageError::Corrupted(format!("slot {}: {}", slot_id, e))
        })
    }

    fn in_bounds(&self, slot: &Slot) -> bool {
        let start = slot.offset as usize;
        start >= self.layout.metadata_size()
            && start + (slot.length as usize) < self.layout.page_size()
    }

    fn read_slot(&self, slot_id: usize) -> Slot {
        let base = slot_id * SLOT_ENTRY_SIZE;
        Slot {
            occupied: self.data[base + OCCUPIED_OFFSET] != 0,
            offset: LittleEndian::read_u16(&self.data[base + OFFSET_OFFSET..]),
            length: LittleEndian::read_u16(&self.data[base + LENGTH_OFFSET..]),
        }
    }

    fn write_slot(&mut self, slot_id: usize, slot: Slot) {
        let base = slot_id * SLOT_ENTRY_SIZE;
        self.data[base + OCCUPIED_OFFSET] = slot.occupied as u8;
        LittleEndian::write_u16(&mut self.data[base + OFFSET_OFFSET..], slot.offset);
        LittleEndian::write_u16(&mut self.data[base + LENGTH_OFFSET..], slot.length);
    }
}
