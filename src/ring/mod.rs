//! Circular record log
//!
//! The engine behind the log device:
//!
//! - `RecordStore`: fixed ring of the K most recent records, evicting the
//!   oldest on overflow
//! - `WriteAccumulator`: stages partial writes until a newline arrives
//! - `OffsetResolver`: maps a logical byte offset onto a record
//! - `CommandSeeker`: maps (record index, offset) back onto a logical offset
//!
//! Nothing here locks; the device serializes every call with one guard.

mod accumulator;
mod errors;
mod record;
mod resolver;
mod seeker;
mod store;

pub use accumulator::{WriteAccumulator, RECORD_DELIMITER};
pub use errors::{RingError, RingResult};
pub use record::Record;
pub use resolver::OffsetResolver;
pub use seeker::{CommandPosition, CommandSeeker};
pub use store::RecordStore;

/// Default number of retained records
pub const DEFAULT_CAPACITY: usize = 10;
