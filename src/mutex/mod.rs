//! File-based mutex engine.
//!
//! # Lock Files
//!
//! A mutex `id` under a root directory lives in `root/id/`:
//! - `id-mutex.lck`: the target lock file. Its existence means "locked";
//!   its content is the millisecond timestamp of the holder's last refresh.
//! - `id-candidate-*.tmp`: private scratch files, one per waiting engine.
//!
//! # Acquisition
//!
//! A waiting engine writes its timestamp into its candidate file and
//! hard-links the candidate to the target name. Linking fails if the name
//! exists, which makes publishing atomic: exactly one contender wins and no
//! one observes a partially written lock.
//!
//! # Dead Locks
//!
//! Liveness is judged only from the timestamp. A lock whose timestamp is
//! older than the dead-age threshold is removed by the next contender, so a
//! holder that crashed without releasing does not block the mutex forever.
//! The threshold trades false positives (too short reclaims locks whose
//! holders are merely slow to refresh) against false negatives (too long
//! leaves a crashed holder's lock stranded). Clock skew between machines is
//! not compensated for.
//!
//! # Ownership
//!
//! Ownership is by name only: any engine bound to the same id can release
//! the lock. Acquisition order among contenders is not FIFO.

mod cancel;
mod engine;
mod guard;
mod operations;
mod timestamp;
mod types;


// Re-export public API
pub use cancel::{CancelToken, Interrupt};
pub use engine::{FileMutex, normalize_id};
pub use guard::MutexGuard;
pub use operations::{acquire, refresh, release, status};
pub use types::{DEFAULT_DEAD_AGE, DEFAULT_PULSE, DEFAULT_REFRESH, MutexOptions, MutexStatus};
