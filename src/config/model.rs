//! Config struct definition and default implementation.

use super::duration::serde_duration;
use crate::mutex::MutexOptions;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the fmutex command line.
///
/// Mirrors an optional YAML file. Unknown fields are ignored for forward
/// compatibility; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Mutex identity
    // =========================================================================
    /// Root directory for mutex(es). Defaults to the system temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Mutex id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // =========================================================================
    // Output
    // =========================================================================
    /// Suppress all output.
    #[serde(default)]
    pub silent: bool,

    // =========================================================================
    // Lock timings
    // =========================================================================
    /// Delay between subsequent locking attempts.
    #[serde(default = "default_pulse", with = "serde_duration")]
    pub pulse: TimeDelta,

    /// How often the timestamp in the lock file is saved.
    #[serde(default = "default_refresh", with = "serde_duration")]
    pub refresh: TimeDelta,

    /// Age after which a lock is considered dead (<= 0 disables reclamation).
    #[serde(default = "default_dead_age", with = "serde_duration")]
    pub dead_age: TimeDelta,

    /// Locking timeout (<= 0 waits forever).
    #[serde(default, with = "serde_duration")]
    pub timeout: TimeDelta,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            id: None,
            silent: false,
            pulse: default_pulse(),
            refresh: default_refresh(),
            dead_age: default_dead_age(),
            timeout: TimeDelta::zero(),
        }
    }
}

fn default_pulse() -> TimeDelta {
    MutexOptions::default().pulse
}

fn default_refresh() -> TimeDelta {
    MutexOptions::default().refresh
}

fn default_dead_age() -> TimeDelta {
    MutexOptions::default().dead_age
}
