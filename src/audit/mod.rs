//! Audit trail recorder
//!
//! Appends a bounded history of field-level changes onto a record already
//! loaded into memory. Storage-agnostic: persisting the mutated record is
//! the caller's responsibility via the file store.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::core::{ChangeEntry, Record};

/// Maximum number of entries kept per record; the oldest are evicted first.
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// Default window for [`get_recent_changes`].
pub const DEFAULT_RECENT_COUNT: usize = 10;

/// Append one change entry to the record's audit trail.
///
/// Lazily initializes the history, stamps the entry with the current time,
/// and truncates the history to its last [`MAX_HISTORY_ENTRIES`] entries.
/// Mutates `record` and returns it for chaining.
pub fn record_change<'a>(
    record: &'a mut Record,
    field: &str,
    old_value: impl Into<Value>,
    new_value: impl Into<Value>,
    changed_by: &str,
    changed_by_name: &str,
    reason: Option<&str>,
) -> &'a mut Record {
    let mut history = record.change_history();

    history.push(ChangeEntry {
        field: field.to_string(),
        old_value: old_value.into(),
        new_value: new_value.into(),
        changed_by: changed_by.to_string(),
        changed_by_name: changed_by_name.to_string(),
        changed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        reason: reason.map(str::to_string),
    });

    if history.len() > MAX_HISTORY_ENTRIES {
        let excess = history.len() - MAX_HISTORY_ENTRIES;
        history.drain(..excess);
    }

    record.set_change_history(history);
    record
}

/// The record's full audit trail, oldest first. Empty if none.
pub fn get_change_history(record: &Record) -> Vec<ChangeEntry> {
    record.change_history()
}

/// The last `count` changes, oldest first.
pub fn get_recent_changes(record: &Record, count: usize) -> Vec<ChangeEntry> {
    let history = record.change_history();
    let skip = history.len().saturating_sub(count);
    history.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        let mut record = Record::new();
        record.set("id", "r1");
        record.set("status", "active");
        record
    }

    #[test]
    fn test_record_change_initializes_history() {
        let mut record = sample_record();
        record_change(
            &mut record,
            "status",
            "active",
            "archived",
            "u1",
            "Alice",
            Some("cleanup"),
        );

        let history = get_change_history(&record);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field, "status");
        assert_eq!(history[0].old_value, "active");
        assert_eq!(history[0].new_value, "archived");
        assert_eq!(history[0].changed_by, "u1");
        assert_eq!(history[0].changed_by_name, "Alice");
        assert_eq!(history[0].reason.as_deref(), Some("cleanup"));
        assert!(!history[0].changed_at.is_empty());
    }

    #[test]
    fn test_history_capped_at_50_keeping_newest() {
        let mut record = sample_record();
        for i in 0..60 {
            record_change(
                &mut record,
                "counter",
                i,
                i + 1,
                "u1",
                "Alice",
                None,
            );
        }

        let history = get_change_history(&record);
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        // The remaining entries are the last 50 in insertion order.
        assert_eq!(history[0].old_value, 10);
        assert_eq!(history[49].old_value, 59);
    }

    #[test]
    fn test_get_recent_changes() {
        let mut record = sample_record();
        for i in 0..15 {
            record_change(&mut record, "counter", i, i + 1, "u1", "Alice", None);
        }

        let recent = get_recent_changes(&record, DEFAULT_RECENT_COUNT);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].old_value, 5);
        assert_eq!(recent[9].old_value, 14);

        // Asking for more than exists returns everything.
        let all = get_recent_changes(&record, 100);
        assert_eq!(all.len(), 15);
    }

    #[test]
    fn test_history_survives_serialization() {
        let mut record = sample_record();
        record_change(&mut record, "price", 100, 90, "u2", "Bob", None);

        let json = serde_json::to_value(&record).unwrap();
        let entry = &json["changeHistory"][0];
        assert_eq!(entry["field"], "price");
        assert_eq!(entry["oldValue"], 100);
        assert_eq!(entry["newValue"], 90);
        assert_eq!(entry["changedBy"], "u2");
        assert_eq!(entry["changedByName"], "Bob");
        assert!(entry["reason"].is_null());

        let round: Record = serde_json::from_value(json).unwrap();
        assert_eq!(get_change_history(&round).len(), 1);
    }
}
