//! The file mutex engine: acquisition loop, dead-lock reclamation and release.

use super::cancel::CancelToken;
use super::guard::MutexGuard;
use super::timestamp;
use super::types::{MutexOptions, MutexStatus};
use crate::error::{MutexError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Suffix of the target lock file: `<id>-mutex.lck`.
const LOCK_SUFFIX: &str = "-mutex.lck";

/// Candidate files are named `<id>-candidate-<random>.tmp`.
const CANDIDATE_INFIX: &str = "-candidate-";
const CANDIDATE_SUFFIX: &str = ".tmp";

/// A mutual exclusion lock based on filesystem primitives.
///
/// Every `FileMutex` built with the same root directory and id (compared
/// case-insensitively) refers to the same lock, whether in this process or
/// another one sharing the filesystem.
///
/// Ownership is by name only: any instance can release a lock, including
/// one it did not acquire.
#[derive(Debug, Clone)]
pub struct FileMutex {
    id: String,
    directory: PathBuf,
    pulse: Duration,
    refresh: Duration,
    dead_age: Option<Duration>,
}

impl FileMutex {
    /// Create a mutex under `root` with default timings.
    pub fn new<P: AsRef<Path>>(root: P, id: &str) -> Result<Self> {
        Self::with_options(root, id, MutexOptions::default())
    }

    /// Create a mutex under `root` with explicit timings.
    ///
    /// The lock directory `root/<id>` is created with owner-only permissions
    /// if it does not exist yet.
    ///
    /// # Errors
    ///
    /// * `MutexError::Config` - The id is blank or is not a plain file name
    /// * `MutexError::Io` - The root cannot be resolved or the directory cannot be created
    pub fn with_options<P: AsRef<Path>>(root: P, id: &str, options: MutexOptions) -> Result<Self> {
        let id = normalize_id(id)?;
        let root = root.as_ref();
        let root = std::path::absolute(root).map_err(|e| {
            MutexError::Io(format!(
                "cannot resolve root directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        let directory = root.join(&id);
        create_lock_dir(&directory)?;

        Ok(Self {
            id,
            directory,
            pulse: options.resolved_pulse(),
            refresh: options.resolved_refresh(),
            dead_age: options.resolved_dead_age(),
        })
    }

    /// The normalized mutex id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The directory holding the lock and candidate files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The absolute path of the target lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.directory.join(format!("{}{}", self.id, LOCK_SUFFIX))
    }

    /// The sleep between publish attempts.
    pub fn pulse(&self) -> Duration {
        self.pulse
    }

    /// How often a waiting contender rewrites its candidate timestamp.
    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    /// The dead-age threshold, or `None` when reclamation is disabled.
    pub fn dead_age(&self) -> Option<Duration> {
        self.dead_age
    }

    /// When the current holder last refreshed the lock.
    ///
    /// Returns `None` if the mutex is unlocked or its lock file cannot be parsed.
    pub fn locked_since(&self) -> Option<DateTime<Utc>> {
        timestamp::read(&self.lock_path()).and_then(timestamp::to_datetime)
    }

    /// Snapshot of the mutex state. Has no side effects.
    pub fn status(&self) -> MutexStatus {
        MutexStatus::new(self.id.clone(), self.lock_path(), self.locked_since())
    }

    /// Lock the mutex, waiting as long as it takes.
    ///
    /// # Panics
    ///
    /// Panics if the lock cannot be acquired. Use [`try_lock`](Self::try_lock)
    /// to handle failures.
    pub fn lock(&self) {
        if let Err(e) = self.lock_with_cancel(&CancelToken::new()) {
            panic!("{}", e);
        }
    }

    /// Unlock the mutex.
    ///
    /// # Panics
    ///
    /// Panics if the lock file cannot be removed, including when the mutex is
    /// not locked. Use [`try_unlock`](Self::try_unlock) to handle failures.
    pub fn unlock(&self) {
        if let Err(e) = self.try_unlock() {
            panic!("{}", e);
        }
    }

    /// Try to lock the mutex within `timeout`.
    ///
    /// A zero or negative timeout waits indefinitely.
    ///
    /// # Errors
    ///
    /// * `MutexError::Expired` - The timeout elapsed before the lock was acquired
    /// * `MutexError::Io` - The candidate or lock file could not be written
    pub fn try_lock(&self, timeout: TimeDelta) -> Result<()> {
        let token = CancelToken::new();
        match timeout.to_std() {
            Ok(timeout) if !timeout.is_zero() => self.lock_with_cancel(&token.with_timeout(timeout)),
            _ => self.lock_with_cancel(&token),
        }
    }

    /// Lock the mutex, waiting until acquired or until `cancel` fires.
    ///
    /// Each call stages the current timestamp in a private candidate file and
    /// repeatedly tries to hard-link it to the target lock file name. The link
    /// fails while another holder owns the name; between attempts the engine
    /// sleeps for the pulse interval. Once per refresh interval it rewrites
    /// the candidate timestamp and, if enabled, removes a target lock whose
    /// timestamp is older than the dead-age threshold.
    ///
    /// The candidate file is removed on every exit path.
    pub fn lock_with_cancel(&self, cancel: &CancelToken) -> Result<()> {
        let candidate = tempfile::Builder::new()
            .prefix(&format!("{}{}", self.id, CANDIDATE_INFIX))
            .suffix(CANDIDATE_SUFFIX)
            .tempfile_in(&self.directory)
            .map_err(|e| {
                MutexError::Io(format!("cannot create candidate lock {}: {}", self.id, e))
            })?;

        let target = self.lock_path();
        let refresh = millis(self.refresh);
        let mut last_written: Option<i64> = None;

        loop {
            if last_written.is_none_or(|ts| timestamp::now_millis() - ts > refresh) {
                let written = timestamp::rewrite(candidate.path()).map_err(|e| {
                    MutexError::Io(format!(
                        "cannot write current timestamp for candidate lock {}: {}",
                        self.id, e
                    ))
                })?;
                last_written = Some(written);

                if self.reclaim_if_dead(&target)
                    && let Some(interrupt) = cancel.sleep(self.pulse * 2)
                {
                    return Err(interrupt.into_error(&self.id));
                }
            }

            match fs::hard_link(candidate.path(), &target) {
                Ok(()) => {
                    let written = last_written.unwrap_or_default();
                    if timestamp::now_millis() - written > refresh {
                        self.rewrite_published(&target)?;
                    }
                    debug!("mutex '{}' locked ({})", self.id, target.display());
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(MutexError::Io(format!(
                        "cannot publish lock '{}': {}",
                        target.display(),
                        e
                    )));
                }
            }

            if let Some(interrupt) = cancel.sleep(self.pulse) {
                debug!("gave up waiting for mutex '{}': {:?}", self.id, interrupt);
                return Err(interrupt.into_error(&self.id));
            }
        }
    }

    /// Lock the mutex within `timeout` and return a guard that unlocks on drop.
    pub fn acquire(&self, timeout: TimeDelta) -> Result<MutexGuard<'_>> {
        self.try_lock(timeout)?;
        Ok(MutexGuard::new(self))
    }

    /// Like [`acquire`](Self::acquire), governed by a cancellation token.
    pub fn acquire_with_cancel(&self, cancel: &CancelToken) -> Result<MutexGuard<'_>> {
        self.lock_with_cancel(cancel)?;
        Ok(MutexGuard::new(self))
    }

    /// Unlock the mutex by removing the target lock file.
    ///
    /// No ownership check is performed.
    ///
    /// # Errors
    ///
    /// * `MutexError::NotLocked` - The lock file does not exist
    /// * `MutexError::Io` - The lock file could not be removed
    pub fn try_unlock(&self) -> Result<()> {
        let target = self.lock_path();
        fs::remove_file(&target).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                MutexError::NotLocked(target.display().to_string())
            } else {
                MutexError::Io(format!(
                    "cannot unlock mutex '{}' ({}): {}",
                    self.id,
                    target.display(),
                    e
                ))
            }
        })?;
        debug!("mutex '{}' released", self.id);
        Ok(())
    }

    /// Rewrite the timestamp of the held lock so contenders see it as alive.
    ///
    /// Never creates the lock file; refreshing an unlocked mutex fails with
    /// `MutexError::NotLocked`.
    pub fn refresh_timestamp(&self) -> Result<DateTime<Utc>> {
        let target = self.lock_path();
        let written = timestamp::rewrite(&target).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                MutexError::NotLocked(target.display().to_string())
            } else {
                MutexError::Io(format!(
                    "cannot write current timestamp for lock {}: {}",
                    self.id, e
                ))
            }
        })?;
        Ok(timestamp::to_datetime(written).unwrap_or_else(Utc::now))
    }

    /// Remove the target lock if its timestamp is older than the dead-age threshold.
    ///
    /// A lock file without a readable timestamp is aged by its modification
    /// time instead. Returns true when the lock was judged dead.
    fn reclaim_if_dead(&self, target: &Path) -> bool {
        let Some(dead_age) = self.dead_age else {
            return false;
        };
        let refreshed_at = match timestamp::read(target) {
            Some(ts) => ts,
            None => match timestamp::modified_millis(target) {
                Some(ts) => {
                    debug!(
                        "lock {} has no readable timestamp, using its modification time",
                        target.display()
                    );
                    ts
                }
                None => return false,
            },
        };

        let age = timestamp::now_millis() - refreshed_at;
        if age <= millis(dead_age) {
            return false;
        }

        warn!(
            "mutex '{}' was last refreshed {} ms ago, removing dead lock {}",
            self.id,
            age,
            target.display()
        );
        // Contenders may race to remove the same dead lock.
        if let Err(e) = fs::remove_file(target)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!("failed to remove dead lock '{}': {}", target.display(), e);
        }
        true
    }

    /// Stamp a freshly published lock whose candidate timestamp went stale.
    fn rewrite_published(&self, target: &Path) -> Result<()> {
        timestamp::rewrite(target).map(|_| ()).map_err(|e| {
            // Do not leave a lock behind that the caller believes it never got
            if let Err(remove_err) = fs::remove_file(target) {
                warn!(
                    "failed to remove unstamped lock '{}': {}",
                    target.display(),
                    remove_err
                );
            }
            MutexError::Io(format!(
                "cannot write current timestamp for target lock {}: {}",
                self.id, e
            ))
        })
    }
}

/// Normalize a mutex id: trimmed and lower-cased.
///
/// The id becomes a directory and file name prefix, so it must be a plain
/// file name.
pub fn normalize_id(id: &str) -> Result<String> {
    let id = id.trim().to_lowercase();
    if id.is_empty() {
        return Err(MutexError::Config("mutex id must not be empty".to_string()));
    }
    if id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(MutexError::Config(format!(
            "invalid mutex id '{}': must not be '.', '..' or contain path separators",
            id
        )));
    }
    Ok(id)
}

fn create_lock_dir(directory: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(directory).map_err(|e| {
        MutexError::Io(format!(
            "cannot create directory '{}': {}",
            directory.display(),
            e
        ))
    })
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
