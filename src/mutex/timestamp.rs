//! Millisecond timestamps stored in candidate and lock files.
//!
//! The on-disk format is a single decimal integer (milliseconds since the
//! Unix epoch) followed by a newline.

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Read the timestamp stored in `path`.
///
/// Returns `None` if the file is missing, unreadable or does not hold a
/// positive integer.
pub(crate) fn read(path: &Path) -> Option<i64> {
    let content = fs::read_to_string(path).ok()?;
    content.trim().parse::<i64>().ok().filter(|ts| *ts > 0)
}

/// Overwrite an existing file with the current timestamp.
///
/// The file is never created: rewriting a lock file that disappeared must
/// not publish a lock behind the atomic link. Returns the written value.
pub(crate) fn rewrite(path: &Path) -> io::Result<i64> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    let timestamp = now_millis();
    file.write_all(format!("{}\n", timestamp).as_bytes())?;
    file.sync_all()?;
    Ok(timestamp)
}

/// Modification time of `path` in milliseconds since the Unix epoch.
///
/// Used to age a lock file whose content was lost, for example when its
/// holder crashed between truncating and rewriting it.
pub(crate) fn modified_millis(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).timestamp_millis())
}

pub(crate) fn to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read(&dir.path().join("absent.lck")), None);
    }

    #[test]
    fn read_tolerates_surrounding_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.lck");
        fs::write(&path, "  1700000000123 \n").unwrap();
        assert_eq!(read(&path), Some(1_700_000_000_123));
    }

    #[test]
    fn read_rejects_garbage_and_non_positive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.lck");

        fs::write(&path, "not a number\n").unwrap();
        assert_eq!(read(&path), None);

        fs::write(&path, "0\n").unwrap();
        assert_eq!(read(&path), None);

        fs::write(&path, "-5\n").unwrap();
        assert_eq!(read(&path), None);
    }

    #[test]
    fn rewrite_replaces_content_with_newline_terminated_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.lck");
        fs::write(&path, "99999999999999999999 leftover content").unwrap();

        let written = rewrite(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{}\n", written));
        assert_eq!(read(&path), Some(written));
    }

    #[test]
    fn rewrite_does_not_create_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.lck");

        let err = rewrite(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!path.exists());
    }

    #[test]
    fn modified_millis_follows_file_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.lck");
        assert_eq!(modified_millis(&path), None);

        fs::write(&path, "").unwrap();
        let backdated = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(backdated)
            .unwrap();

        let expected = DateTime::<Utc>::from(backdated).timestamp_millis();
        assert!((modified_millis(&path).unwrap() - expected).abs() < 1000);
    }

    #[test]
    fn to_datetime_keeps_millisecond_precision() {
        let dt = to_datetime(1_700_000_000_123).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_123);
    }
}
