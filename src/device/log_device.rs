//! The shared log device
//!
//! One `LogDevice` is built at service start and shared (via `Arc`) by
//! every open handle. All ring and accumulator state sits behind a single
//! `AccessGuard`; every operation below takes it exactly once.

use std::sync::Arc;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::ring::{
    CommandPosition, CommandSeeker, OffsetResolver, Record, RecordStore, RingResult,
    WriteAccumulator, DEFAULT_CAPACITY, RECORD_DELIMITER,
};

use super::file::LogFile;
use super::guard::{AccessGuard, Interrupt};

/// Construction parameters for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Number of records retained
    pub capacity: usize,
    /// Cap on staged bytes, 0 for none
    pub max_pending_bytes: usize,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_pending_bytes: 0,
        }
    }
}

/// What teardown released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    pub records_released: usize,
    pub pending_bytes_discarded: usize,
}

/// State guarded by the device lock
#[derive(Debug)]
pub(crate) struct DeviceState {
    store: RecordStore,
    accumulator: WriteAccumulator,
}

/// Result of one write under the lock
struct WriteOutcome {
    committed: Option<usize>,
    evicted: Option<Record>,
    retained: usize,
}

impl DeviceState {
    fn write(&mut self, bytes: &[u8]) -> RingResult<WriteOutcome> {
        self.accumulator.append(bytes)?;

        let mut outcome = WriteOutcome {
            committed: None,
            evicted: None,
            retained: self.store.occupied(),
        };

        if let Some(record) = self.accumulator.try_complete(RECORD_DELIMITER) {
            outcome.committed = Some(record.len());
            outcome.evicted = self.store.add(record);
            outcome.retained = self.store.occupied();
        }

        Ok(outcome)
    }

    /// Retained bytes from logical `offset` to the end
    fn contents_from(&self, offset: u64) -> Vec<u8> {
        let mut out = Vec::new();
        let mut at = offset;
        loop {
            let chunk = OffsetResolver::read_at(&self.store, at, usize::MAX);
            if chunk.is_empty() {
                return out;
            }
            out.extend_from_slice(chunk);
            at += chunk.len() as u64;
        }
    }
}

/// Append-only log device backed by a bounded record ring
#[derive(Debug)]
pub struct LogDevice {
    state: AccessGuard<DeviceState>,
    metrics: Arc<MetricsRegistry>,
    options: DeviceOptions,
}

impl LogDevice {
    /// Create a device retaining `capacity` records.
    pub fn new(capacity: usize) -> RingResult<Self> {
        Self::with_options(DeviceOptions {
            capacity,
            ..DeviceOptions::default()
        })
    }

    /// Create a device with explicit options and a private metrics registry.
    pub fn with_options(options: DeviceOptions) -> RingResult<Self> {
        Self::with_metrics(options, Arc::new(MetricsRegistry::new()))
    }

    /// Create a device reporting into a shared metrics registry.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `options.capacity` is zero.
    pub fn with_metrics(options: DeviceOptions, metrics: Arc<MetricsRegistry>) -> RingResult<Self> {
        let store = RecordStore::with_capacity(options.capacity)?;
        let accumulator = WriteAccumulator::with_limit(options.max_pending_bytes);

        log_event_with_fields(
            Event::DeviceInit,
            &[
                ("capacity", options.capacity.to_string().as_str()),
                ("max_pending_bytes", options.max_pending_bytes.to_string().as_str()),
            ],
        );

        Ok(Self {
            state: AccessGuard::new(DeviceState { store, accumulator }),
            metrics,
            options,
        })
    }

    /// Open a new handle positioned at offset 0
    pub fn open(self: &Arc<Self>) -> LogFile {
        LogFile::new(Arc::clone(self))
    }

    pub fn options(&self) -> DeviceOptions {
        self.options
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Feed `bytes` through the accumulator, committing a record when a
    /// newline is pending. Returns the number of bytes accepted.
    pub(crate) async fn write(&self, bytes: &[u8], interrupt: &Interrupt) -> RingResult<usize> {
        let mut state = self.lock(interrupt).await?;
        let result = state.write(bytes).map(|outcome| (outcome, ()));
        drop(state);

        self.finish_write(bytes, result)?;
        Ok(bytes.len())
    }

    /// Write `bytes` and copy out everything retained afterwards, in one
    /// critical section.
    pub(crate) async fn write_and_snapshot(
        &self,
        bytes: &[u8],
        interrupt: &Interrupt,
    ) -> RingResult<Vec<u8>> {
        let mut state = self.lock(interrupt).await?;
        let result = match state.write(bytes) {
            Ok(outcome) => Ok((outcome, state.contents_from(0))),
            Err(e) => Err(e),
        };
        drop(state);

        let contents = self.finish_write(bytes, result)?;
        self.metrics.record_read(contents.len() as u64);
        Ok(contents)
    }

    /// Account for a write done under the lock and hand back its payload
    fn finish_write<R>(&self, bytes: &[u8], result: RingResult<(WriteOutcome, R)>) -> RingResult<R> {
        let (outcome, payload) = match result {
            Ok(done) => done,
            Err(e) => {
                self.metrics.increment_writes_rejected();
                log_event_with_fields(
                    Event::WriteRejected,
                    &[("bytes", bytes.len().to_string().as_str()), ("code", e.code())],
                );
                return Err(e);
            }
        };

        self.metrics.add_bytes_accepted(bytes.len() as u64);

        if let Some(len) = outcome.committed {
            self.metrics.increment_records_committed();
            log_event_with_fields(
                Event::RecordCommit,
                &[
                    ("bytes", len.to_string().as_str()),
                    ("retained", outcome.retained.to_string().as_str()),
                ],
            );
        }

        if let Some(evicted) = outcome.evicted {
            self.metrics.increment_records_evicted();
            log_event_with_fields(
                Event::RecordEvict,
                &[("bytes", evicted.len().to_string().as_str())],
            );
        }

        Ok(payload)
    }

    /// Copy up to `max_len` bytes at logical `offset`. Empty at end of data.
    pub(crate) async fn read_at(
        &self,
        offset: u64,
        max_len: usize,
        interrupt: &Interrupt,
    ) -> RingResult<Vec<u8>> {
        let state = self.lock(interrupt).await?;
        let bytes = OffsetResolver::read_at(&state.store, offset, max_len).to_vec();
        drop(state);

        self.metrics.record_read(bytes.len() as u64);
        Ok(bytes)
    }

    /// Size of all retained records
    pub async fn total_size(&self, interrupt: &Interrupt) -> RingResult<u64> {
        let state = self.lock(interrupt).await?;
        Ok(state.store.total_size())
    }

    /// Run `f` against the retained total size under the lock
    pub(crate) async fn with_total_size<R>(
        &self,
        interrupt: &Interrupt,
        f: impl FnOnce(u64) -> RingResult<R>,
    ) -> RingResult<R> {
        let state = self.lock(interrupt).await?;
        f(state.store.total_size())
    }

    /// Logical offset for a record-indexed position
    pub(crate) async fn offset_for(
        &self,
        position: CommandPosition,
        interrupt: &Interrupt,
    ) -> RingResult<u64> {
        let state = self.lock(interrupt).await?;
        CommandSeeker::offset_for(&state.store, position)
    }

    /// Resolve a record-indexed position and copy everything from there to
    /// the end, in one critical section. Returns the resolved offset too.
    pub(crate) async fn read_from_command(
        &self,
        position: CommandPosition,
        interrupt: &Interrupt,
    ) -> RingResult<(u64, Vec<u8>)> {
        let state = self.lock(interrupt).await?;
        let offset = CommandSeeker::offset_for(&state.store, position)?;
        let bytes = state.contents_from(offset);
        drop(state);

        self.metrics.record_read(bytes.len() as u64);
        Ok((offset, bytes))
    }

    /// Copies of every retained record, oldest first
    pub async fn records(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock_uninterruptible().await;
        state
            .store
            .iter()
            .map(|(_, record)| record.as_bytes().to_vec())
            .collect()
    }

    /// Bytes staged but not yet committed
    pub async fn pending_len(&self) -> usize {
        self.state.lock_uninterruptible().await.accumulator.pending_len()
    }

    /// Release every retained record and the staging buffer.
    ///
    /// Waits for in-flight operations; the device stays usable (and empty)
    /// afterwards.
    pub async fn teardown(&self) -> Teardown {
        let mut state = self.state.lock_uninterruptible().await;
        let report = Teardown {
            records_released: state.store.clear(),
            pending_bytes_discarded: state.accumulator.clear(),
        };
        drop(state);

        log_event_with_fields(
            Event::DeviceTeardown,
            &[
                ("pending_bytes_discarded", report.pending_bytes_discarded.to_string().as_str()),
                ("records_released", report.records_released.to_string().as_str()),
            ],
        );

        report
    }

    async fn lock(
        &self,
        interrupt: &Interrupt,
    ) -> RingResult<tokio::sync::MutexGuard<'_, DeviceState>> {
        self.state.lock(interrupt).await.map_err(|e| {
            self.metrics.increment_lock_interruptions();
            log_event_with_fields(Event::LockInterrupted, &[("code", e.code())]);
            e
        })
    }

    #[cfg(test)]
    pub(crate) fn guard(&self) -> &AccessGuard<DeviceState> {
        &self.state
    }
}
