//! RAII guard for a held mutex.

use super::engine::FileMutex;
use crate::error::Result;
use chrono::{DateTime, Utc};
use log::warn;
use std::path::PathBuf;
use std::time::Instant;

/// RAII guard for a held [`FileMutex`].
///
/// When dropped, the lock file is deleted. If deletion fails, a warning is
/// logged but no panic occurs.
#[derive(Debug)]
pub struct MutexGuard<'a> {
    mutex: &'a FileMutex,

    /// When the lock timestamp was last written by this guard.
    last_refresh: Instant,

    /// Whether the lock has been released manually.
    released: bool,
}

impl<'a> MutexGuard<'a> {
    pub(super) fn new(mutex: &'a FileMutex) -> Self {
        Self {
            mutex,
            last_refresh: Instant::now(),
            released: false,
        }
    }

    /// The mutex this guard holds.
    pub fn mutex(&self) -> &FileMutex {
        self.mutex
    }

    /// Path to the lock file.
    pub fn path(&self) -> PathBuf {
        self.mutex.lock_path()
    }

    /// Rewrite the lock timestamp now.
    pub fn refresh(&mut self) -> Result<DateTime<Utc>> {
        let written = self.mutex.refresh_timestamp()?;
        self.last_refresh = Instant::now();
        Ok(written)
    }

    /// Rewrite the lock timestamp if the refresh interval has elapsed.
    ///
    /// Cheap enough to call from every iteration of a long-running loop.
    /// Returns whether a rewrite happened.
    pub fn refresh_if_due(&mut self) -> Result<bool> {
        if self.last_refresh.elapsed() < self.mutex.refresh() {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    /// Manually release the lock, reporting failures to the caller.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.mutex.try_unlock()
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.mutex.try_unlock()
        {
            warn!("failed to release mutex '{}': {}", self.mutex.id(), e);
        }
    }
}
