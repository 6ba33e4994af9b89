//! fmutex: mutual exclusion through a shared filesystem.
//!
//! Independent processes, possibly on different machines sharing a network
//! filesystem, coordinate access to a named resource without a lock server.
//! The lock is a file published with an atomic hard link; its content is a
//! liveness timestamp that lets contenders reclaim locks abandoned by
//! crashed holders.
//!
//! ```no_run
//! use chrono::TimeDelta;
//! use fmutex::FileMutex;
//!
//! let mutex = FileMutex::new("/shared/locks", "init-step")?;
//! let guard = mutex.acquire(TimeDelta::seconds(30))?;
//! // ... critical section ...
//! guard.release()?;
//! # Ok::<(), fmutex::MutexError>(())
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod mutex;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{MutexError, Result};
pub use mutex::{CancelToken, FileMutex, MutexGuard, MutexOptions, MutexStatus};
