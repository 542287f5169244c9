//! Single lock serializing every device operation
//!
//! Acquisition is the only place a device call can wait. A waiting caller
//! can be interrupted through its `Interrupt` handle; the call then fails
//! with `Interrupted` before touching any state.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, Notify};

use crate::ring::{RingError, RingResult};

/// Cancellation signal for lock waits.
///
/// A trigger cancels only the waits in progress at that moment. With nobody
/// waiting it is dropped, so it never reaches a later, unrelated call.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    notify: Arc<Notify>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every wait currently in progress on this signal
    pub fn trigger(&self) {
        self.notify.notify_waiters();
    }

    async fn raised(&self) {
        self.notify.notified().await;
    }
}

/// Mutual exclusion over the device state
#[derive(Debug)]
pub struct AccessGuard<T> {
    inner: Mutex<T>,
}

impl<T> AccessGuard<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Acquire the lock, giving up if `interrupt` fires while waiting.
    ///
    /// A free lock is always taken.
    pub async fn lock(&self, interrupt: &Interrupt) -> RingResult<MutexGuard<'_, T>> {
        tokio::select! {
            biased;
            guard = self.inner.lock() => Ok(guard),
            _ = interrupt.raised() => Err(RingError::Interrupted),
        }
    }

    /// Acquire the lock, waiting as long as it takes
    pub async fn lock_uninterruptible(&self) -> MutexGuard<'_, T> {
        self.inner.lock().await
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
