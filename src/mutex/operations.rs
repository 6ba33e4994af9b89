//! One-shot operations addressed by root directory and mutex id.
//!
//! These are the entry points used by the command line: each call builds a
//! fresh [`FileMutex`], so no state is kept between invocations.

use super::engine::FileMutex;
use super::types::{MutexOptions, MutexStatus};
use crate::error::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::path::Path;

/// Acquire the mutex `id` under `root`.
///
/// A zero or negative `timeout` waits indefinitely. The lock stays held after
/// this returns; it is released by [`release`] (from any process).
///
/// # Returns
///
/// * `Ok(FileMutex)` - The lock is held
/// * `Err(MutexError::Expired)` - The timeout elapsed first
/// * `Err(MutexError::Io)` / `Err(MutexError::Config)` - The mutex could not be set up
pub fn acquire<P: AsRef<Path>>(
    root: P,
    id: &str,
    options: MutexOptions,
    timeout: TimeDelta,
) -> Result<FileMutex> {
    let mutex = FileMutex::with_options(root, id, options)?;
    mutex.try_lock(timeout)?;
    Ok(mutex)
}

/// Release the mutex `id` under `root`.
///
/// Returns `MutexError::NotLocked` when there is nothing to release.
pub fn release<P: AsRef<Path>>(root: P, id: &str) -> Result<()> {
    FileMutex::new(root, id)?.try_unlock()
}

/// Query the mutex `id` under `root` without side effects on the lock.
pub fn status<P: AsRef<Path>>(root: P, id: &str) -> Result<MutexStatus> {
    Ok(FileMutex::new(root, id)?.status())
}

/// Refresh the timestamp of the held mutex `id` under `root`.
pub fn refresh<P: AsRef<Path>>(root: P, id: &str) -> Result<DateTime<Utc>> {
    FileMutex::new(root, id)?.refresh_timestamp()
}
