//! Observable events
//!
//! Every line the service logs names one of these.

use std::fmt;

/// Observable events in ringlog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Device lifecycle
    /// Device context created
    DeviceInit,
    /// Device context torn down, storage released
    DeviceTeardown,

    // Ring operations
    /// A record was committed into the ring
    RecordCommit,
    /// The oldest record was evicted
    RecordEvict,
    /// A write was refused (allocation or limit)
    WriteRejected,
    /// A lock wait was interrupted
    LockInterrupted,
    /// A record-indexed seek named a position outside retained data
    SeekRejected,

    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // Ingestion server
    /// Listener bound
    ServerStart,
    /// Client connected
    ConnectionAccepted,
    /// Client disconnected
    ConnectionClosed,
    /// Client failed mid-session
    ConnectionFailed,
    /// SIGINT or SIGTERM received
    ShutdownSignal,
    /// Listener closed, backends released
    ServerStop,

    /// Counter dump
    Metrics,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DeviceInit => "DEVICE_INIT",
            Event::DeviceTeardown => "DEVICE_TEARDOWN",
            Event::RecordCommit => "RECORD_COMMIT",
            Event::RecordEvict => "RECORD_EVICT",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::LockInterrupted => "LOCK_INTERRUPTED",
            Event::SeekRejected => "SEEK_REJECTED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerStart => "SERVER_START",
            Event::ConnectionAccepted => "CONNECTION_ACCEPTED",
            Event::ConnectionClosed => "CONNECTION_CLOSED",
            Event::ConnectionFailed => "CONNECTION_FAILED",
            Event::ShutdownSignal => "SHUTDOWN_SIGNAL",
            Event::ServerStop => "SERVER_STOP",
            Event::Metrics => "METRICS",
        }
    }

    /// Whether this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::WriteRejected
                | Event::LockInterrupted
                | Event::SeekRejected
                | Event::ConnectionFailed
        )
    }

    /// Whether this event fires once per device operation
    pub fn is_per_operation(&self) -> bool {
        matches!(self, Event::RecordCommit | Event::RecordEvict)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
