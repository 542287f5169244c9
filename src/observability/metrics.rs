//! Metrics registry for ringlog
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Relaxed atomics, never taken under the device lock's critical path

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for the device and the ingestion server
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    records_committed: AtomicU64,
    records_evicted: AtomicU64,
    bytes_accepted: AtomicU64,
    bytes_read: AtomicU64,
    reads: AtomicU64,
    seeks: AtomicU64,
    seeks_rejected: AtomicU64,
    writes_rejected: AtomicU64,
    lock_interruptions: AtomicU64,
    connections_accepted: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Ring

    pub fn increment_records_committed(&self) {
        self.records_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_evicted(&self) {
        self.records_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_accepted(&self, bytes: u64) {
        self.bytes_accepted.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_writes_rejected(&self) {
        self.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Reads and seeks

    /// Count one read returning `bytes`
    pub fn record_read(&self, bytes: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_seeks(&self) {
        self.seeks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_seeks_rejected(&self) {
        self.seeks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Locking and connections

    pub fn increment_lock_interruptions(&self) {
        self.lock_interruptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_connections(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get records committed
    pub fn records_committed(&self) -> u64 {
        self.records_committed.load(Ordering::Relaxed)
    }

    /// Get records evicted
    pub fn records_evicted(&self) -> u64 {
        self.records_evicted.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_committed: self.records_committed.load(Ordering::Relaxed),
            records_evicted: self.records_evicted.load(Ordering::Relaxed),
            bytes_accepted: self.bytes_accepted.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            seeks: self.seeks.load(Ordering::Relaxed),
            seeks_rejected: self.seeks_rejected.load(Ordering::Relaxed),
            writes_rejected: self.writes_rejected.load(Ordering::Relaxed),
            lock_interruptions: self.lock_interruptions.load(Ordering::Relaxed),
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_committed: u64,
    pub records_evicted: u64,
    pub bytes_accepted: u64,
    pub bytes_read: u64,
    pub reads: u64,
    pub seeks: u64,
    pub seeks_rejected: u64,
    pub writes_rejected: u64,
    pub lock_interruptions: u64,
    pub connections_accepted: u64,
}

impl MetricsSnapshot {
    /// Counters as log fields, in declaration order
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("records_committed", self.records_committed.to_string()),
            ("records_evicted", self.records_evicted.to_string()),
            ("bytes_accepted", self.bytes_accepted.to_string()),
            ("bytes_read", self.bytes_read.to_string()),
            ("reads", self.reads.to_string()),
            ("seeks", self.seeks.to_string()),
            ("seeks_rejected", self.seeks_rejected.to_string()),
            ("writes_rejected", self.writes_rejected.to_string()),
            ("lock_interruptions", self.lock_interruptions.to_string()),
            ("connections_accepted", self.connections_accepted.to_string()),
        ]
    }
}
