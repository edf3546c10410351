//! Last-known-value cells shared between one producer and many consumers.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::with_timeout;

use crate::wait::Wait;

mod sensors;

pub use sensors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    /// Lock held elsewhere and the caller asked not to wait.
    Busy,
    /// Lock still held when the caller's bound ran out.
    Timeout,
}

/// Scoped access to a record; the lock is released when this is dropped.
pub type RecordGuard<'a, T> = MutexGuard<'a, CriticalSectionRawMutex, T>;

/// A sensor domain's data behind one lock covering every field.
///
/// There is no raw lock/unlock: all access goes through a guard, so each
/// exit path releases the lock. Interrupt handlers must use
/// [`SharedRecord::try_acquire`] (or [`Wait::Poll`]) and skip the update on
/// [`AccessError::Busy`].
pub struct SharedRecord<T> {
    inner: Mutex<CriticalSectionRawMutex, T>,
}

impl<T> SharedRecord<T> {
    pub const fn new(init: T) -> Self {
        Self {
            inner: Mutex::new(init),
        }
    }

    /// Try once. Never suspends, so it is safe from interrupt context.
    pub fn try_acquire(&self) -> Result<RecordGuard<'_, T>, AccessError> {
        self.inner.try_lock().map_err(|_| AccessError::Busy)
    }

    pub async fn acquire(&self, wait: Wait) -> Result<RecordGuard<'_, T>, AccessError> {
        match wait {
            Wait::Poll => self.try_acquire(),
            Wait::For(d) => with_timeout(d, self.inner.lock())
                .await
                .map_err(|_| AccessError::Timeout),
            Wait::Forever => Ok(self.inner.lock().await),
        }
    }

    /// Overwrite the whole record.
    pub async fn publish(&self, value: T, wait: Wait) -> Result<(), AccessError> {
        *self.acquire(wait).await? = value;
        Ok(())
    }

    /// Non-blocking wholesale overwrite; on contention the update is skipped.
    pub fn try_publish(&self, value: T) -> Result<(), AccessError> {
        *self.try_acquire()? = value;
        Ok(())
    }

    /// Copy out the fields a consumer needs and release immediately.
    pub async fn read_with<R>(&self, wait: Wait, f: impl FnOnce(&T) -> R) -> Result<R, AccessError> {
        let guard = self.acquire(wait).await?;
        Ok(f(&guard))
    }
}

impl<T: Clone> SharedRecord<T> {
    pub async fn snapshot(&self, wait: Wait) -> Result<T, AccessError> {
        self.read_with(wait, T::clone).await
    }

    pub fn try_snapshot(&self) -> Result<T, AccessError> {
        Ok(self.try_acquire()?.clone())
    }
}
