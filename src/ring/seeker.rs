//! Record-indexed seek
//!
//! Translates "byte N of the i-th retained record" into the logical offset
//! a reader would use.

use serde::{Deserialize, Serialize};

use super::errors::{RingError, RingResult};
use super::store::RecordStore;

/// A position named by record index and offset within that record.
///
/// `index` counts from the oldest retained record (0 = oldest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPosition {
    pub index: u32,
    pub offset: u32,
}

impl CommandPosition {
    pub fn new(index: u32, offset: u32) -> Self {
        Self { index, offset }
    }
}

/// Maps command positions onto logical offsets
pub struct CommandSeeker;

impl CommandSeeker {
    /// Logical offset of `offset` bytes into the record at `index`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `index` is not a retained record or `offset`
    /// is not inside it. Never mutates the store.
    pub fn offset_for(store: &RecordStore, position: CommandPosition) -> RingResult<u64> {
        let index = position.index as usize;
        let occupied = store.occupied();

        if index >= occupied {
            return Err(RingError::invalid_argument(format!(
                "record index {} out of range ({} retained)",
                index, occupied
            )));
        }

        let record = store.get(index).ok_or_else(|| {
            RingError::invalid_argument(format!("record index {} has no content", index))
        })?;

        if position.offset as usize >= record.len() {
            return Err(RingError::invalid_argument(format!(
                "offset {} outside record {} of length {}",
                position.offset,
                index,
                record.len()
            )));
        }

        let before: u64 = store
            .iter()
            .take(index)
            .map(|(_, r)| r.len() as u64)
            .sum();

        Ok(before + u64::from(position.offset))
    }
}
