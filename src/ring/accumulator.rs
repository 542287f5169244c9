//! Staging buffer for not-yet-delimited writes
//!
//! Bytes from successive writes pile up here until a delimiter shows up
//! anywhere in the pending buffer. At that point the whole buffer, including
//! any bytes after the delimiter, becomes one record.

use super::errors::{RingError, RingResult};
use super::record::Record;

/// Newline, the record terminator used by the device
pub const RECORD_DELIMITER: u8 = b'\n';

/// Pending bytes waiting for a delimiter
#[derive(Debug, Default)]
pub struct WriteAccumulator {
    /// Un-committed bytes
    pending: Vec<u8>,
    /// Upper bound on pending bytes, `None` for no bound
    limit: Option<usize>,
}

impl WriteAccumulator {
    /// Create an empty accumulator with no size bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator that refuses to hold more than `limit`
    /// pending bytes. A limit of zero means no bound.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            limit: (limit > 0).then_some(limit),
        }
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending bytes
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending bytes
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Append `bytes` to the pending buffer.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the buffer cannot grow (or would exceed the
    /// configured limit). The pending buffer is left exactly as it was and
    /// none of `bytes` is absorbed.
    pub fn append(&mut self, bytes: &[u8]) -> RingResult<()> {
        let combined = self
            .pending
            .len()
            .checked_add(bytes.len())
            .ok_or_else(|| RingError::out_of_memory(bytes.len()))?;

        if let Some(limit) = self.limit {
            if combined > limit {
                return Err(RingError::out_of_memory(bytes.len()));
            }
        }

        self.pending
            .try_reserve(bytes.len())
            .map_err(|e| RingError::from_reserve(bytes.len(), e))?;
        self.pending.extend_from_slice(bytes);

        Ok(())
    }

    /// Hand the whole pending buffer over as a record if it contains
    /// `delimiter`. Otherwise nothing changes.
    pub fn try_complete(&mut self, delimiter: u8) -> Option<Record> {
        if !self.pending.contains(&delimiter) {
            return None;
        }
        Some(Record::from_buffer(std::mem::take(&mut self.pending)))
    }

    /// Drop any pending bytes, returning how many were discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending = Vec::new();
        discarded
    }
}
