//! Where received bytes go
//!
//! `Device` feeds the bounded record ring; `File` appends to a plain file
//! that is never evicted and is deleted at shutdown.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::{Backend, Config};
use crate::device::{LogDevice, LogFile};
use crate::observability::MetricsRegistry;
use crate::ring::CommandPosition;

use super::errors::ServerResult;

/// Plain append file, serialized by one lock
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn append(&self, bytes: &[u8]) -> ServerResult<()> {
        let _held = self.lock.lock().await;
        self.append_unlocked(bytes).await
    }

    /// Append, then read the whole file back, under one lock hold
    async fn append_and_read(&self, bytes: &[u8]) -> ServerResult<Vec<u8>> {
        let _held = self.lock.lock().await;
        self.append_unlocked(bytes).await?;
        match fs::read(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn append_unlocked(&self, bytes: &[u8]) -> ServerResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn remove(&self) -> ServerResult<bool> {
        let _held = self.lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Storage shared by all connections
#[derive(Debug, Clone)]
pub enum Sink {
    Device(Arc<LogDevice>),
    File(Arc<FileSink>),
}

impl Sink {
    /// Build the backend named in `config`
    pub fn from_config(config: &Config, metrics: Arc<MetricsRegistry>) -> ServerResult<Self> {
        Ok(match config.backend {
            Backend::Device => Sink::Device(Arc::new(LogDevice::with_metrics(
                config.device_options(),
                metrics,
            )?)),
            Backend::File => Sink::File(Arc::new(FileSink::new(&config.data_file))),
        })
    }

    /// Per-connection view of the sink
    pub fn session(&self) -> Session {
        match self {
            Sink::Device(device) => Session::Device(device.open()),
            Sink::File(file) => Session::File(Arc::clone(file)),
        }
    }

    /// Release backend storage at shutdown
    pub async fn shutdown(&self) -> ServerResult<()> {
        match self {
            Sink::Device(device) => {
                device.teardown().await;
            }
            Sink::File(file) => {
                file.remove().await?;
            }
        }
        Ok(())
    }
}

/// One connection's handle onto the sink
#[derive(Debug)]
pub enum Session {
    Device(LogFile),
    File(Arc<FileSink>),
}

impl Session {
    /// Whether `SEEKTO:` control lines are honoured
    pub fn supports_seek(&self) -> bool {
        matches!(self, Session::Device(_))
    }

    /// Store received bytes
    pub async fn append(&mut self, bytes: &[u8]) -> ServerResult<()> {
        match self {
            Session::Device(file) => {
                file.write(bytes).await?;
            }
            Session::File(sink) => sink.append(bytes).await?,
        }
        Ok(())
    }

    /// Store received bytes and return everything readable afterwards.
    ///
    /// No other connection's bytes can land between the two steps.
    pub async fn append_and_read(&mut self, bytes: &[u8]) -> ServerResult<Vec<u8>> {
        match self {
            Session::Device(file) => Ok(file.write_and_read_all(bytes).await?),
            Session::File(sink) => sink.append_and_read(bytes).await,
        }
    }

    /// Everything from a record-indexed position to the end.
    ///
    /// Returns `None` for sinks without record structure.
    pub async fn contents_from(
        &mut self,
        position: CommandPosition,
    ) -> ServerResult<Option<Vec<u8>>> {
        match self {
            Session::Device(file) => Ok(Some(file.read_from_command(position).await?)),
            Session::File(_) => Ok(None),
        }
    }
}
