//! Committed log records
//!
//! A record is created only when the write accumulator sees a delimiter and
//! hands over its staging buffer. It is never mutated afterwards; its storage
//! is released when the record is dropped (on eviction or teardown).

use std::fmt;

/// An immutable, delimiter-terminated unit of written data
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    data: Vec<u8>,
}

impl Record {
    /// Take ownership of a finished buffer
    pub(crate) fn from_buffer(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Record contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the record holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("len", &self.data.len())
            .field("data", &String::from_utf8_lossy(&self.data))
            .finish()
    }
}
