use crate::mutex::{FileMutex, MutexOptions};
use chrono::TimeDelta;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Timings short enough for tests: 10ms pulse, 1s refresh, 60m dead age.
pub(crate) fn fast_options() -> MutexOptions {
    MutexOptions::new(
        TimeDelta::milliseconds(10),
        TimeDelta::seconds(1),
        TimeDelta::minutes(60),
    )
}

pub(crate) fn fast_mutex(root: &Path, id: &str) -> FileMutex {
    FileMutex::with_options(root, id, fast_options()).unwrap()
}

/// Write a lock file whose timestamp is `age` in the past.
pub(crate) fn write_aged_lock(mutex: &FileMutex, age: Duration) -> i64 {
    let millis = i64::try_from(age.as_millis()).unwrap();
    let timestamp = chrono::Utc::now().timestamp_millis() - millis;
    std::fs::write(mutex.lock_path(), format!("{}\n", timestamp)).unwrap();
    timestamp
}

/// Write an empty lock file whose modification time is `age` in the past.
pub(crate) fn write_empty_aged_lock(mutex: &FileMutex, age: Duration) {
    let file = std::fs::File::create(mutex.lock_path()).unwrap();
    file.set_modified(std::time::SystemTime::now() - age).unwrap();
}

/// Candidate files left behind in the mutex directory.
pub(crate) fn candidate_files(mutex: &FileMutex) -> Vec<PathBuf> {
    std::fs::read_dir(mutex.directory())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("tmp"))
        .collect()
}

pub(crate) fn temp_root() -> TempDir {
    TempDir::new().unwrap()
}
