//! Ring error types
//!
//! Error codes:
//! - RING_OUT_OF_MEMORY (allocation failed while staging or committing bytes)
//! - RING_IO_FAULT (bytes could not be moved across a copy boundary)
//! - RING_INVALID_ARGUMENT (bad seek position or record index)
//! - RING_INTERRUPTED (lock wait cancelled, retry)
//!
//! Reading past the end of retained data is not an error: readers get
//! zero bytes back.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type for ring operations
pub type RingResult<T> = Result<T, RingError>;

/// Errors surfaced by the record ring and the device built on it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Staging buffer could not grow
    #[error("out of memory: could not absorb {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Copy into or out of the ring failed
    #[error("I/O fault: {0}")]
    IoFault(String),

    /// Position or index outside retained data
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Lock wait was interrupted before any state was touched
    #[error("interrupted while waiting for device lock")]
    Interrupted,
}

impl RingError {
    /// Create an out-of-memory error for a failed reservation
    pub fn out_of_memory(requested: usize) -> Self {
        RingError::OutOfMemory { requested }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        RingError::InvalidArgument(message.into())
    }

    /// Create an I/O fault error
    pub fn io_fault(message: impl Into<String>) -> Self {
        RingError::IoFault(message.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RingError::OutOfMemory { .. } => "RING_OUT_OF_MEMORY",
            RingError::IoFault(_) => "RING_IO_FAULT",
            RingError::InvalidArgument(_) => "RING_INVALID_ARGUMENT",
            RingError::Interrupted => "RING_INTERRUPTED",
        }
    }

    /// Whether the caller should simply retry the same call
    pub fn is_retryable(&self) -> bool {
        matches!(self, RingError::Interrupted)
    }

    /// Map a failed reservation onto `OutOfMemory`
    pub(crate) fn from_reserve(requested: usize, _err: TryReserveError) -> Self {
        RingError::out_of_memory(requested)
    }
}

impl From<std::io::Error> for RingError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::Interrupted => RingError::Interrupted,
            std::io::ErrorKind::OutOfMemory => RingError::out_of_memory(0),
            std::io::ErrorKind::InvalidInput => RingError::invalid_argument(e.to_string()),
            _ => RingError::io_fault(e.to_string()),
        }
    }
}
