//! Locked file store
//!
//! All access to the JSON data files goes through [`FileStore`], which
//! serializes every read and write per file behind an exclusive advisory
//! lock and snapshots the previous contents before each overwrite.

mod config;
mod lock;

pub use config::StoreConfig;
pub use lock::FileLock;

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{error, warn};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::backup::BackupManager;
use crate::core::{Document, Result, StoreError};

/// File-backed JSON document store.
///
/// Each collection is one pretty-printed JSON array file under the data
/// directory. Operations on the same file are serialized by an exclusive
/// per-file lock (across tasks and across OS processes); operations on
/// different files never block each other.
///
/// # Examples
///
/// ```
/// use flatstore::{FileStore, Record};
///
/// # #[tokio::main]
/// # async fn main() -> flatstore::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let store = FileStore::new(dir.path())?;
///
/// let mut doc = store.read_document("listings.json").await?;
/// let mut record = Record::new();
/// record.set("id", FileStore::generate_id());
/// record.set("title", "Seaside studio");
/// doc.push(record);
///
/// store.write_document("listings.json", &doc).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileStore {
    config: StoreConfig,
    backups: BackupManager,
}

impl FileStore {
    /// Create a store rooted at `data_dir`, creating the directory if needed.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(StoreConfig::new(data_dir))
    }

    /// Create a store with custom lock and retention settings.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let backups = BackupManager::new(&config);
        Ok(Self { config, backups })
    }

    /// The backup manager for this store's data directory.
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `operation` while holding the exclusive lock for `filename`.
    ///
    /// The data file is created as an empty `[]` array first if absent, so
    /// the lock always guards an existing file. The lock is acquired with a
    /// bounded retry budget (see [`StoreConfig`]); exhausting it yields
    /// [`StoreError::LockContention`]. The critical section runs on the
    /// blocking thread pool so its file I/O never stalls the async runtime.
    /// The lock is released exactly once, whether or not `operation`
    /// succeeds, and release failures are logged rather than masking the
    /// operation's own result. There is no fairness guarantee between
    /// waiters.
    pub async fn with_lock<T, F>(&self, filename: &str, operation: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        validate_filename(filename)?;
        let path = self.config.data_dir.join(filename);

        let init_path = path.clone();
        tokio::task::spawn_blocking(move || ensure_data_file(&init_path))
            .await
            .map_err(|err| {
                StoreError::OperationFailed(format!("file init task aborted: {err}"))
            })??;

        let lock = FileLock::acquire(
            &path,
            self.config.lock_retries,
            self.config.lock_min_backoff,
            self.config.lock_max_backoff,
        )
        .await?;

        // The lock moves into the blocking task so it is released there,
        // after the operation, no matter how the operation ends.
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || {
            let result = operation(lock.path());
            if let Err(err) = &result {
                error!("Error in locked operation for {filename}: {err}");
            }
            drop(lock);
            result
        })
        .await
        .map_err(|err| StoreError::OperationFailed(format!("locked operation aborted: {err}")))?
    }

    /// Read and decode the document stored in `filename`.
    ///
    /// A missing or empty file decodes to an empty document. Contents that
    /// are not a valid JSON array yield [`StoreError::CorruptData`] so the
    /// caller can choose a recovery path, e.g. restore from a backup.
    pub async fn read_document(&self, filename: &str) -> Result<Document> {
        let name = filename.to_string();
        self.with_lock(filename, move |path| read_document_at(path, &name))
            .await
    }

    /// Like [`read_document`](Self::read_document), but substitutes an empty
    /// document for corrupt contents instead of failing. Availability over
    /// strictness; the corruption is logged.
    pub async fn read_document_or_empty(&self, filename: &str) -> Result<Document> {
        match self.read_document(filename).await {
            Ok(doc) => Ok(doc),
            Err(StoreError::CorruptData { path, source }) => {
                warn!("Corrupt data in {path}, substituting empty document: {source}");
                Ok(Document::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Replace the document stored in `filename`.
    ///
    /// If the file already has contents, a timestamped backup is taken
    /// first. The new contents are committed atomically (temp file + rename),
    /// so an interrupted write never leaves a partially-written file.
    pub async fn write_document(&self, filename: &str, document: &Document) -> Result<bool> {
        let backups = self.backups.clone();
        let name = filename.to_string();
        let document = document.clone();
        self.with_lock(filename, move |path| {
            commit_document(&backups, &name, path, &document)?;
            Ok(true)
        })
        .await
    }

    /// Read, mutate, and write back the document under one lock hold.
    ///
    /// Unlike a separate read followed by a write, no other writer can
    /// slip in between the two steps.
    pub async fn update_document<F>(&self, filename: &str, mutator: F) -> Result<bool>
    where
        F: FnOnce(&mut Document) -> Result<()> + Send + 'static,
    {
        let backups = self.backups.clone();
        let name = filename.to_string();
        self.with_lock(filename, move |path| {
            let mut document = read_document_at(path, &name)?;
            mutator(&mut document)?;
            commit_document(&backups, &name, path, &document)?;
            Ok(true)
        })
        .await
    }

    /// Generate an opaque record ID: millisecond timestamp in base 36 plus a
    /// random suffix.
    pub fn generate_id() -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}{}", to_base36(millis), &suffix[..10])
    }
}

/// Snapshot the existing file, then atomically replace it with the
/// serialized document. Must be called with the file's lock held.
fn commit_document(
    backups: &BackupManager,
    filename: &str,
    path: &Path,
    document: &Document,
) -> Result<()> {
    if path.exists() {
        // A failed snapshot is logged but does not block the write,
        // matching the availability-first backup policy.
        if let Err(err) = backups.snapshot(filename) {
            error!("Error creating backup for {filename}: {err}");
        }
    }

    let json = serde_json::to_string_pretty(document)
        .map_err(|err| StoreError::Serialization(err.to_string()))?;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(json.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| StoreError::Io(err.error))?;

    Ok(())
}

fn read_document_at(path: &Path, filename: &str) -> Result<Document> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Document::new()),
        Err(err) => return Err(err.into()),
    };

    if contents.trim().is_empty() {
        return Ok(Document::new());
    }

    serde_json::from_str(&contents).map_err(|source| StoreError::CorruptData {
        path: filename.to_string(),
        source,
    })
}

/// Create the data file holding an empty `[]` array if it does not exist.
fn ensure_data_file(path: &Path) -> Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(b"[]")?;
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Filenames must be a single path component; anything that could escape the
/// data directory is rejected.
pub(crate) fn validate_filename(filename: &str) -> Result<()> {
    let valid = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidFilename(filename.to_string()))
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}
