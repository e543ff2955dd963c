//! Sentinel lock files shared between threads and processes.
//!
//! A lock is held while its file exists. It is created with `create_new`, so
//! at most one holder can succeed, and removed when the guard drops. Files
//! older than [`STALE_AFTER`] are assumed to belong to a crashed holder and
//! are evicted.

use crate::error::AppError;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub const STALE_AFTER: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_millis(2);

#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the lock, or `None` if someone else currently holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<LockFile>, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        match create_sentinel(path) {
            Ok(lock) => Ok(Some(lock)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if !evict_stale(path) {
                    return Ok(None);
                }
                match create_sentinel(path) {
                    Ok(lock) => Ok(Some(lock)),
                    Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(None),
                    Err(err) => Err(lock_error(path, &err)),
                }
            }
            Err(err) => Err(lock_error(path, &err)),
        }
    }

    /// Take the lock, retrying until `timeout` runs out.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<LockFile, AppError> {
        let started = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if started.elapsed() > timeout {
                return Err(AppError::io(format!(
                    "timed out waiting for lock {}",
                    path.display()
                )));
            }
            std::thread::sleep(RETRY_DELAY);
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to release lock");
        }
    }
}

fn create_sentinel(path: &Path) -> std::io::Result<LockFile> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let lock = LockFile {
        path: path.to_path_buf(),
    };
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    // Contents are informational only.
    let _ = write!(file, "{} {}", std::process::id(), millis);
    Ok(lock)
}

/// Remove the lock file if it is older than [`STALE_AFTER`].
fn evict_stale(path: &Path) -> bool {
    let Ok(modified) = std::fs::metadata(path).and_then(|metadata| metadata.modified()) else {
        return false;
    };
    let Ok(age) = SystemTime::now().duration_since(modified) else {
        return false;
    };
    if age <= STALE_AFTER {
        return false;
    }

    debug!(path = %path.display(), age_ms = age.as_millis() as u64, "evicting stale lock");
    std::fs::remove_file(path).is_ok()
}

fn lock_error(path: &Path, err: &std::io::Error) -> AppError {
    AppError::io(format!("failed to create lock {}: {}", path.display(), err))
}
