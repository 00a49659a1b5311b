//! Core data model: open-shaped records, audit entries, backup metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field under which a record keeps its audit trail.
pub const CHANGE_HISTORY_FIELD: &str = "changeHistory";

/// The decoded contents of one data file: records in file order
/// (semantically append order).
pub type Document = Vec<Record>;

/// One entity stored in a [`Document`].
///
/// Records are deliberately open-shaped: collections are heterogeneous and no
/// schema is enforced, so a record is a JSON object with typed access to the
/// few fields the store itself cares about (`id`, `changeHistory`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The record's opaque string ID, if present.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Decoded audit trail, empty if the field is absent or malformed.
    pub fn change_history(&self) -> Vec<ChangeEntry> {
        self.0
            .get(CHANGE_HISTORY_FIELD)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub(crate) fn set_change_history(&mut self, history: Vec<ChangeEntry>) {
        // Entries are plain data; serialization cannot fail.
        let value = serde_json::to_value(history).unwrap_or(Value::Array(Vec::new()));
        self.0.insert(CHANGE_HISTORY_FIELD.to_string(), value);
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One field-level change in a record's audit trail.
///
/// Field names serialize in camelCase to match the on-disk document format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    /// Identity of the actor who made the change.
    pub changed_by: String,
    /// Display name of the actor.
    pub changed_by_name: String,
    /// ISO-8601 timestamp.
    pub changed_at: String,
    pub reason: Option<String>,
}

/// Metadata for one backup of a data file.
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    /// Backup filename, e.g. `listings.json.backup.2026-08-26T10-15-30.123Z`.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation time (file modification time).
    pub created: DateTime<Utc>,
}
