//! Exit code constants for the fmutex CLI.
//!
//! - 0: Success (or `test` found the mutex locked)
//! - 1: Mutex is not locked (`test`, or release/refresh of an absent lock)
//! - 2: User error (bad args, invalid configuration)
//! - 3: Filesystem I/O failure
//! - 4: Lock acquisition expired or was cancelled

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// The mutex is not locked.
pub const NOT_LOCKED: i32 = 1;

/// User error: bad arguments, invalid identifier or configuration.
pub const USER_ERROR: i32 = 2;

/// I/O failure: directory, candidate or lock file could not be handled.
pub const IO_FAILURE: i32 = 3;

/// Lock acquisition timed out or was cancelled.
pub const LOCK_EXPIRED: i32 = 4;
