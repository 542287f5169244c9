//! Fixed-capacity ring of records
//!
//! Slots `[out, in)` (cyclic) are occupied when the ring is not full; when
//! full every slot is occupied and `out == in`. Walking from `out` yields
//! records oldest first. Inserting into a full ring evicts the record at
//! `out` and hands it back to the caller.

use super::errors::{RingError, RingResult};
use super::record::Record;

/// Ring of the K most recent records
#[derive(Debug)]
pub struct RecordStore {
    /// One slot per retained record
    slots: Vec<Option<Record>>,
    /// Next slot to fill
    in_offs: usize,
    /// Oldest occupied slot
    out_offs: usize,
    /// All slots occupied
    full: bool,
}

impl RecordStore {
    /// Create an empty ring with `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> RingResult<Self> {
        if capacity == 0 {
            return Err(RingError::invalid_argument("ring capacity must be > 0"));
        }

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Ok(Self {
            slots,
            in_offs: 0,
            out_offs: 0,
            full: false,
        })
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot is occupied
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Number of retained records
    pub fn occupied(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            (self.in_offs + self.capacity() - self.out_offs) % self.capacity()
        }
    }

    /// Whether no record is retained
    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    /// Insert `record` as the newest entry.
    ///
    /// Returns the evicted oldest record when the ring was already full.
    /// Dropping the returned value releases its storage.
    pub fn add(&mut self, record: Record) -> Option<Record> {
        let cap = self.capacity();

        let evicted = if self.full {
            let oldest = self.slots[self.out_offs].take();
            self.out_offs = (self.out_offs + 1) % cap;
            oldest
        } else {
            None
        };

        self.slots[self.in_offs] = Some(record);
        self.in_offs = (self.in_offs + 1) % cap;

        if self.in_offs == self.out_offs {
            self.full = true;
        }

        evicted
    }

    /// Records in retention order, oldest first, with their slot index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Record)> + '_ {
        let cap = self.capacity();
        let start = self.out_offs;
        (0..self.occupied()).filter_map(move |i| {
            let slot = (start + i) % cap;
            self.slots[slot].as_ref().map(|record| (slot, record))
        })
    }

    /// Record at logical position `index` (0 = oldest retained).
    pub fn get(&self, index: usize) -> Option<&Record> {
        if index >= self.occupied() {
            return None;
        }
        let slot = (self.out_offs + index) % self.capacity();
        self.slots[slot].as_ref()
    }

    /// Sum of the lengths of all retained records
    pub fn total_size(&self) -> u64 {
        self.iter().map(|(_, record)| record.len() as u64).sum()
    }

    /// Drop every retained record and reset the cursors.
    ///
    /// Returns how many records were released.
    pub fn clear(&mut self) -> usize {
        let released = self.slots.iter_mut().filter_map(Option::take).count();
        self.in_offs = 0;
        self.out_offs = 0;
        self.full = false;
        released
    }
}
