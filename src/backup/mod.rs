//! Backup management: snapshot-before-write, bounded retention, restore.
//!
//! Backups live in a `backups/` subdirectory beside the data files, named
//! `<filename>.backup.<ISO-8601 timestamp>` with `:` replaced by `-` so the
//! name is valid on every filesystem. A snapshot is taken before every
//! destructive write, so any corruption introduced by a bad write is one
//! restore away from undone; retention bounds disk growth under frequent
//! writes.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, error, info, warn};

use crate::core::{BackupInfo, Result};
use crate::store::{validate_filename, StoreConfig};

/// Manages timestamped backups for the data files of one store.
#[derive(Debug, Clone)]
pub struct BackupManager {
    data_dir: PathBuf,
    backup_dir: PathBuf,
    keep_count: usize,
}

impl BackupManager {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            backup_dir: config.backup_dir(),
            keep_count: config.backup_keep_count,
        }
    }

    /// Copy the current contents of `filename` to a timestamped backup, then
    /// prune old backups down to the retention count.
    ///
    /// Returns the new backup's filename, or `Ok(None)` if the source file
    /// does not exist (nothing to back up is not an error).
    pub fn snapshot(&self, filename: &str) -> Result<Option<String>> {
        validate_filename(filename)?;

        let data_path = self.data_dir.join(filename);
        if !data_path.exists() {
            return Ok(None);
        }

        fs::create_dir_all(&self.backup_dir)?;

        let timestamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "-");
        let backup_filename = format!("{filename}.backup.{timestamp}");
        let backup_path = self.backup_dir.join(&backup_filename);

        fs::copy(&data_path, &backup_path)?;
        info!("Backup created: {backup_filename}");

        self.prune(filename, self.keep_count)?;

        Ok(Some(backup_filename))
    }

    /// Delete all but the `keep` most recent backups of `filename`.
    ///
    /// Individual deletion failures are logged and do not abort pruning of
    /// the remaining files.
    pub fn prune(&self, filename: &str, keep: usize) -> Result<()> {
        validate_filename(filename)?;

        let mut backups = self.enumerate(filename)?;
        if backups.len() <= keep {
            return Ok(());
        }

        for (name, path, _) in backups.split_off(keep) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Deleted old backup: {name}"),
                Err(err) => error!("Error deleting backup {name}: {err}"),
            }
        }

        Ok(())
    }

    /// Overwrite the live file with the named backup's bytes.
    ///
    /// Returns `Ok(false)` without touching the live file when the backup
    /// does not exist.
    pub fn restore(&self, filename: &str, backup_name: &str) -> Result<bool> {
        validate_filename(filename)?;
        validate_filename(backup_name)?;

        let backup_path = self.backup_dir.join(backup_name);
        if !backup_path.exists() {
            warn!("Backup file not found: {backup_name}");
            return Ok(false);
        }

        let data_path = self.data_dir.join(filename);
        fs::copy(&backup_path, &data_path)?;
        info!("Restored {filename} from backup: {backup_name}");

        Ok(true)
    }

    /// All backups of `filename`, newest first.
    pub fn list(&self, filename: &str) -> Result<Vec<BackupInfo>> {
        validate_filename(filename)?;

        let backups = self
            .enumerate(filename)?
            .into_iter()
            .map(|(name, path, created)| {
                let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                BackupInfo {
                    filename: name,
                    size,
                    created,
                }
            })
            .collect();

        Ok(backups)
    }

    /// Matching backups as (name, path, created), newest first. Creation time
    /// comes from file mtime; the timestamp embedded in the name breaks ties.
    fn enumerate(&self, filename: &str) -> Result<Vec<(String, PathBuf, DateTime<Utc>)>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = format!("{filename}.backup.");
        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) {
                continue;
            }

            let created = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            backups.push((name, entry.path(), created));
        }

        backups.sort_by(|a, b| (b.2, &b.0).cmp(&(a.2, &a.0)));
        Ok(backups)
    }

    /// Directory the backups are stored in.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}
