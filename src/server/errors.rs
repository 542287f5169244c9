//! Ingestion server errors

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::ring::RingError;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised by the ingestion server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Socket or backing file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The log device refused an operation
    #[error("log device error: {0}")]
    Ring(#[from] RingError),

    /// Configuration was unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServerError {
    /// Whether the failure only affects one connection
    pub fn is_connection_scoped(&self) -> bool {
        matches!(self, ServerError::Io(_) | ServerError::Ring(_))
    }
}
