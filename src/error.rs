//! Error types for fmutex.
//!
//! Uses thiserror for derive macros. Every variant carries a message that is
//! ready to be shown to the user as-is.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for mutex operations.
#[derive(Error, Debug)]
pub enum MutexError {
    /// Invalid identifier, configuration value or duration.
    #[error("{0}")]
    Config(String),

    /// A filesystem operation failed.
    #[error("{0}")]
    Io(String),

    /// The acquisition deadline passed before the lock could be taken.
    #[error("cannot lock mutex '{0}': expired")]
    Expired(String),

    /// The acquisition was cancelled before the lock could be taken.
    #[error("cannot lock mutex '{0}': cancelled")]
    Cancelled(String),

    /// Release or refresh was requested for a lock that does not exist.
    #[error("mutex is not locked: {0}")]
    NotLocked(String),
}

impl MutexError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            MutexError::Config(_) => exit_codes::USER_ERROR,
            MutexError::Io(_) => exit_codes::IO_FAILURE,
            MutexError::Expired(_) | MutexError::Cancelled(_) => exit_codes::LOCK_EXPIRED,
            MutexError::NotLocked(_) => exit_codes::NOT_LOCKED,
        }
    }

    /// True when the acquisition gave up waiting, either by deadline or by cancellation.
    ///
    /// These are expected outcomes of a bounded wait rather than system faults.
    pub fn is_expired(&self) -> bool {
        matches!(self, MutexError::Expired(_) | MutexError::Cancelled(_))
    }
}

/// Result type alias for mutex operations.
pub type Result<T> = std::result::Result<T, MutexError>;
