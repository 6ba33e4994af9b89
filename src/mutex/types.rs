//! Engine options and status structures.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default delay between subsequent locking attempts.
pub const DEFAULT_PULSE: Duration = Duration::from_millis(500);

/// Default frequency of saving the current timestamp while waiting.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(10);

/// Default age after which an unrefreshed lock is considered dead.
pub const DEFAULT_DEAD_AGE: Duration = Duration::from_secs(60 * 60);

/// Timing options for a [`FileMutex`](super::FileMutex).
///
/// Durations are signed so values can come straight from user input:
/// - a non-positive `pulse` or `refresh` falls back to the default
/// - a non-positive `dead_age` disables dead-lock reclamation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutexOptions {
    /// Delay between publish attempts under contention.
    pub pulse: TimeDelta,

    /// How often the liveness timestamp is rewritten.
    pub refresh: TimeDelta,

    /// Staleness after which a lock is reclaimed by contenders.
    pub dead_age: TimeDelta,
}

impl Default for MutexOptions {
    fn default() -> Self {
        Self {
            pulse: TimeDelta::milliseconds(500),
            refresh: TimeDelta::seconds(10),
            dead_age: TimeDelta::minutes(60),
        }
    }
}

impl MutexOptions {
    /// Create options from explicit durations.
    pub fn new(pulse: TimeDelta, refresh: TimeDelta, dead_age: TimeDelta) -> Self {
        Self {
            pulse,
            refresh,
            dead_age,
        }
    }

    pub(crate) fn resolved_pulse(&self) -> Duration {
        positive(self.pulse).unwrap_or(DEFAULT_PULSE)
    }

    pub(crate) fn resolved_refresh(&self) -> Duration {
        positive(self.refresh).unwrap_or(DEFAULT_REFRESH)
    }

    pub(crate) fn resolved_dead_age(&self) -> Option<Duration> {
        positive(self.dead_age)
    }
}

fn positive(delta: TimeDelta) -> Option<Duration> {
    if delta <= TimeDelta::zero() {
        return None;
    }
    delta.to_std().ok()
}

/// Point-in-time view of a mutex, as seen on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutexStatus {
    /// The normalized mutex id.
    pub id: String,

    /// Path of the target lock file.
    pub path: PathBuf,

    /// Whether the target lock file holds a valid timestamp.
    pub locked: bool,

    /// Last refresh of the holder's timestamp.
    pub since: Option<DateTime<Utc>>,
}

impl MutexStatus {
    pub(crate) fn new(id: String, path: PathBuf, since: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            path,
            locked: since.is_some(),
            since,
        }
    }

    /// Whether the mutex is currently held.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl std::fmt::Display for MutexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.since {
            Some(since) => write!(
                f,
                "Mutex \"{}\" ({}) is locked: {}",
                self.id,
                self.path.display(),
                since.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            None => write!(
                f,
                "Mutex \"{}\" ({}) is unlocked",
                self.id,
                self.path.display()
            ),
        }
    }
}
