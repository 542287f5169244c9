//! Per-open device handles
//!
//! A `LogFile` is what a caller gets from `LogDevice::open`. It owns the
//! caller's cursor and interrupt signal and nothing else; all shared state
//! lives in the device.

use std::io::SeekFrom;
use std::sync::Arc;

use crate::ring::{CommandPosition, RingError, RingResult};

use super::guard::Interrupt;
use super::log_device::LogDevice;

/// Chunk size used by `read_to_end`
const READ_CHUNK: usize = 4096;

/// An open handle onto a `LogDevice`
#[derive(Debug)]
pub struct LogFile {
    device: Arc<LogDevice>,
    /// Logical read position
    position: u64,
    interrupt: Interrupt,
}

impl LogFile {
    pub(crate) fn new(device: Arc<LogDevice>) -> Self {
        Self {
            device,
            position: 0,
            interrupt: Interrupt::new(),
        }
    }

    /// Current logical position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Handle that can interrupt this file's lock waits from elsewhere
    pub fn interrupter(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn device(&self) -> &Arc<LogDevice> {
        &self.device
    }

    /// Write `bytes` to the log. The cursor does not move.
    ///
    /// # Errors
    ///
    /// `OutOfMemory` if the bytes cannot be staged (nothing is absorbed),
    /// `Interrupted` if the lock wait was cancelled.
    pub async fn write(&mut self, bytes: &[u8]) -> RingResult<usize> {
        self.device.write(bytes, &self.interrupt).await
    }

    /// Read up to `max_len` bytes at the cursor and advance past them.
    ///
    /// An empty result means end of data; the cursor stays put.
    pub async fn read(&mut self, max_len: usize) -> RingResult<Vec<u8>> {
        let bytes = self.device.read_at(self.position, max_len, &self.interrupt).await?;
        self.position += bytes.len() as u64;
        Ok(bytes)
    }

    /// Read up to `max_len` bytes at `offset` without touching the cursor
    pub async fn read_at(&self, offset: u64, max_len: usize) -> RingResult<Vec<u8>> {
        self.device.read_at(offset, max_len, &self.interrupt).await
    }

    /// Read from the cursor until end of data
    pub async fn read_to_end(&mut self) -> RingResult<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let chunk = self.read(READ_CHUNK).await?;
            if chunk.is_empty() {
                return Ok(out);
            }
            out.extend_from_slice(&chunk);
        }
    }

    /// Write `bytes`, then read everything retained, as one atomic step.
    ///
    /// Leaves the cursor at end of data.
    pub async fn write_and_read_all(&mut self, bytes: &[u8]) -> RingResult<Vec<u8>> {
        let contents = self.device.write_and_snapshot(bytes, &self.interrupt).await?;
        self.position = contents.len() as u64;
        Ok(contents)
    }

    /// Seek to a record position and read to end of data, as one atomic
    /// step. On failure the cursor is unchanged.
    pub async fn read_from_command(&mut self, position: CommandPosition) -> RingResult<Vec<u8>> {
        let result = self.device.read_from_command(position, &self.interrupt).await;
        let (offset, bytes) = match result {
            Ok(found) => found,
            Err(e) => return self.finish_seek(Err(e)).map(|_| Vec::new()),
        };

        self.finish_seek(Ok(offset + bytes.len() as u64))?;
        Ok(bytes)
    }

    /// Move the cursor. The result must land in `[0, total_size]`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a target outside that range; the cursor is
    /// unchanged.
    pub async fn seek(&mut self, pos: SeekFrom) -> RingResult<u64> {
        let current = self.position;
        let result = self
            .device
            .with_total_size(&self.interrupt, |total| {
                let target = match pos {
                    SeekFrom::Start(n) => i128::from(n),
                    SeekFrom::Current(delta) => i128::from(current) + i128::from(delta),
                    SeekFrom::End(delta) => i128::from(total) + i128::from(delta),
                };

                if target < 0 || target > i128::from(total) {
                    return Err(RingError::invalid_argument(format!(
                        "seek target {} outside [0, {}]",
                        target, total
                    )));
                }

                Ok(target as u64)
            })
            .await;

        self.finish_seek(result)
    }

    /// Move the cursor to byte `position.offset` of retained record
    /// `position.index` (0 = oldest).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an index or offset outside retained data; the
    /// cursor is unchanged.
    pub async fn seek_to_command(&mut self, position: CommandPosition) -> RingResult<u64> {
        let result = self.device.offset_for(position, &self.interrupt).await;
        self.finish_seek(result)
    }

    fn finish_seek(&mut self, result: RingResult<u64>) -> RingResult<u64> {
        let metrics = self.device.metrics();
        match result {
            Ok(offset) => {
                metrics.increment_seeks();
                self.position = offset;
                Ok(offset)
            }
            Err(e) => {
                if !e.is_retryable() {
                    metrics.increment_seeks_rejected();
                }
                Err(e)
            }
        }
    }

    /// Release the handle
    pub fn close(self) {}
}
