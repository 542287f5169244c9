//! ringlog - a bounded, newline-delimited log service
//!
//! Clients write byte streams that are cut into newline-terminated records;
//! only the most recent K records are kept. Readers see the retained
//! records as one contiguous byte stream and can jump to the start of any
//! record by index.
//!
//! - `ring`: the record ring and its offset arithmetic
//! - `device`: the locked, device-style interface over the ring
//! - `server`: TCP ingestion service in front of the device or a plain file
//! - `config`, `observability`, `cli`: service plumbing

pub mod cli;
pub mod config;
pub mod device;
pub mod observability;
pub mod ring;
pub mod server;
