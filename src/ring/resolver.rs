//! Global offset to record lookup
//!
//! Logical offset 0 is the first byte of the oldest retained record; the
//! retained records laid end to end form one contiguous byte stream.

use super::record::Record;
use super::store::RecordStore;

/// Where a logical offset lands inside the ring
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// Slot holding the record
    pub slot: usize,
    /// The record covering the offset
    pub record: &'a Record,
    /// Offset within the record
    pub local_offset: usize,
}

impl<'a> Resolved<'a> {
    /// Bytes of the record from `local_offset` on
    pub fn remaining(&self) -> &'a [u8] {
        &self.record.as_bytes()[self.local_offset..]
    }
}

/// Maps logical offsets onto records by walking the ring oldest first
pub struct OffsetResolver;

impl OffsetResolver {
    /// Find the record whose byte range contains `global_offset`.
    ///
    /// Returns `None` at or past the end of retained data.
    pub fn resolve(store: &RecordStore, global_offset: u64) -> Option<Resolved<'_>> {
        let mut before = 0u64;

        for (slot, record) in store.iter() {
            let len = record.len() as u64;
            if global_offset < before + len {
                return Some(Resolved {
                    slot,
                    record,
                    local_offset: (global_offset - before) as usize,
                });
            }
            before += len;
        }

        None
    }

    /// Bytes available at `global_offset`, at most `max_len` and never
    /// crossing a record boundary. Empty at end of data.
    pub fn read_at(store: &RecordStore, global_offset: u64, max_len: usize) -> &[u8] {
        match Self::resolve(store, global_offset) {
            Some(found) => {
                let remaining = found.remaining();
                &remaining[..remaining.len().min(max_len)]
            }
            None => &[],
        }
    }
}
