use std::path::PathBuf;
use std::time::Duration;

/// Store configuration
///
/// Controls where data files live and how aggressively lock acquisition
/// retries under contention.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the JSON data files
    pub data_dir: PathBuf,

    /// Maximum number of lock acquisition attempts before giving up
    pub lock_retries: u32,

    /// Backoff before the first retry
    pub lock_min_backoff: Duration,

    /// Backoff ceiling; the delay doubles each attempt up to this cap
    pub lock_max_backoff: Duration,

    /// Number of backups to keep per data file
    pub backup_keep_count: usize,
}

impl StoreConfig {
    /// Create a configuration rooted at the given data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock_retries: 10,
            lock_min_backoff: Duration::from_millis(100),
            lock_max_backoff: Duration::from_millis(1000),
            backup_keep_count: 10,
        }
    }

    /// Set the lock retry budget
    pub fn lock_retries(mut self, retries: u32) -> Self {
        self.lock_retries = retries;
        self
    }

    /// Set the initial retry backoff
    pub fn lock_min_backoff(mut self, backoff: Duration) -> Self {
        self.lock_min_backoff = backoff;
        self
    }

    /// Set the retry backoff ceiling
    pub fn lock_max_backoff(mut self, backoff: Duration) -> Self {
        self.lock_max_backoff = backoff;
        self
    }

    /// Set how many backups are retained per data file
    pub fn backup_keep_count(mut self, count: usize) -> Self {
        self.backup_keep_count = count;
        self
    }

    /// Directory holding backups, a sibling of the data files
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("data")
    }
}
