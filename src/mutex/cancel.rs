//! Cancellation for bounded lock acquisition.
//!
//! A [`CancelToken`] is a cloneable handle: every clone shares the same
//! cancellation flag, so one thread can interrupt an acquisition running on
//! another. Tokens may also carry a deadline, derived with
//! [`CancelToken::with_timeout`] or [`CancelToken::with_deadline`].
//!
//! Waiting is built on a `Mutex` + `Condvar` pair so that cancelling wakes
//! sleepers immediately instead of after their current pulse.

use crate::error::MutexError;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Signal {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

impl Signal {
    fn flag(&self) -> MutexGuard<'_, bool> {
        // The flag is a plain bool, a poisoned lock still holds a valid value.
        self.cancelled
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Why a wait ended before its full duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The token's deadline passed.
    Expired,
    /// [`CancelToken::cancel`] was called.
    Cancelled,
}

impl Interrupt {
    /// Convert into the matching error for the mutex `id`.
    pub fn into_error(self, id: &str) -> MutexError {
        match self {
            Interrupt::Expired => MutexError::Expired(id.to_string()),
            Interrupt::Cancelled => MutexError::Cancelled(id.to_string()),
        }
    }
}

/// Cloneable cancellation signal with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    signal: Arc<Signal>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Create a token that never expires on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a token sharing this token's cancel flag that also expires at `deadline`.
    ///
    /// If this token already has an earlier deadline, the earlier one wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            signal: Arc::clone(&self.signal),
            deadline: Some(deadline),
        }
    }

    /// Derive a token that expires `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// The deadline of this token, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this token and every token derived from or cloned with it.
    pub fn cancel(&self) {
        let mut cancelled = self.signal.flag();
        *cancelled = true;
        self.signal.wakeup.notify_all();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.signal.flag()
    }

    /// Check whether the token has fired, without waiting.
    pub fn check(&self) -> Option<Interrupt> {
        if self.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::Expired),
            _ => None,
        }
    }

    /// Block for `delay`, returning early if the token is cancelled or expires.
    ///
    /// Returns `None` when the full delay elapsed.
    pub fn sleep(&self, delay: Duration) -> Option<Interrupt> {
        let wake_at = Instant::now().checked_add(delay);
        let mut cancelled = self.signal.flag();

        loop {
            if *cancelled {
                return Some(Interrupt::Cancelled);
            }

            let now = Instant::now();
            if let Some(deadline) = self.deadline
                && now >= deadline
            {
                return Some(Interrupt::Expired);
            }

            let until = match (wake_at, self.deadline) {
                (Some(wake_at), Some(deadline)) => wake_at.min(deadline),
                (Some(wake_at), None) => wake_at,
                (None, Some(deadline)) => deadline,
                (None, None) => {
                    cancelled = self
                        .signal
                        .wakeup
                        .wait(cancelled)
                        .unwrap_or_else(|poison| poison.into_inner());
                    continue;
                }
            };

            if now >= until {
                return None;
            }

            let (guard, _) = self
                .signal
                .wakeup
                .wait_timeout(cancelled, until - now)
                .unwrap_or_else(|poison| poison.into_inner());
            cancelled = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_token_does_not_fire() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.check(), None);
        assert_eq!(token.sleep(Duration::from_millis(5)), None);
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        let derived = token.with_timeout(Duration::from_secs(60));

        clone.cancel();

        assert!(token.is_cancelled());
        assert_eq!(derived.check(), Some(Interrupt::Cancelled));
    }

    #[test]
    fn sleep_stops_at_deadline() {
        let token = CancelToken::new().with_timeout(Duration::from_millis(50));
        let start = Instant::now();

        let result = token.sleep(Duration::from_secs(10));

        assert_eq!(result, Some(Interrupt::Expired));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancel_wakes_sleeping_thread() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let start = Instant::now();

        let handle = thread::spawn(move || sleeper.sleep(Duration::from_secs(30)));
        thread::sleep(Duration::from_millis(50));
        token.cancel();

        assert_eq!(handle.join().unwrap(), Some(Interrupt::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn earlier_deadline_wins() {
        let base = CancelToken::new().with_timeout(Duration::from_millis(10));
        let later = base.with_timeout(Duration::from_secs(3600));
        assert_eq!(later.deadline(), base.deadline());
    }

    #[test]
    fn interrupt_maps_to_errors() {
        assert!(matches!(
            Interrupt::Expired.into_error("m"),
            MutexError::Expired(id) if id == "m"
        ));
        assert!(matches!(
            Interrupt::Cancelled.into_error("m"),
            MutexError::Cancelled(id) if id == "m"
        ));
    }
}
