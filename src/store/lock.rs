//! Exclusive per-file advisory locking.
//!
//! Cross-process exclusion comes from an OS advisory lock (`fs2`) on a sidecar
//! `<file>.lock`; same-process exclusion comes from a process-global table of
//! held paths, since OS file locks do not reliably exclude other handles in
//! the same process.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use fs2::FileExt;
use lazy_static::lazy_static;
use log::warn;

use crate::core::{Result, StoreError};

lazy_static! {
    /// Data file paths currently locked by a task in this process.
    static ref HELD_PATHS: Mutex<HashSet<PathBuf>> = Mutex::new(HashSet::new());
}

fn held_paths() -> std::sync::MutexGuard<'static, HashSet<PathBuf>> {
    HELD_PATHS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn forget_path(path: &Path) {
    held_paths().remove(path);
}

/// An exclusive lock on one data file.
///
/// Held for the duration of a single critical section; released when dropped.
/// Release failures are logged and never surfaced, so they cannot mask the
/// outcome of the operation that ran under the lock.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    file: File,
}

impl FileLock {
    /// Attempt to take the lock once. `Ok(None)` means the file is currently
    /// held elsewhere (this process or another).
    fn try_acquire(path: &Path) -> Result<Option<FileLock>> {
        if !held_paths().insert(path.to_path_buf()) {
            return Ok(None);
        }

        let lock_path = lock_path_for(path);
        let file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(err) => {
                forget_path(path);
                return Err(err.into());
            }
        };

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(FileLock {
                path: path.to_path_buf(),
                file,
            })),
            Err(_) => {
                // Held by another process.
                forget_path(path);
                Ok(None)
            }
        }
    }

    /// Acquire the lock for `path`, retrying with growing backoff.
    ///
    /// Makes up to `retries` attempts; the delay between attempts starts at
    /// `min_backoff` and doubles up to `max_backoff`. There is no fairness
    /// guarantee between waiters, so starvation under heavy contention is
    /// possible. Exhausting the budget yields [`StoreError::LockContention`].
    pub async fn acquire(
        path: &Path,
        retries: u32,
        min_backoff: Duration,
        max_backoff: Duration,
    ) -> Result<FileLock> {
        let mut backoff = min_backoff;

        for attempt in 0..retries.max(1) {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }

            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
        }

        Err(StoreError::LockContention {
            path: path.display().to_string(),
            attempts: retries.max(1),
        })
    }

    /// Path of the data file this lock guards.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            warn!("Error releasing lock for {}: {}", self.path.display(), err);
        }
        forget_path(&self.path);
    }
}

/// Sidecar lock file path for a data file.
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}
