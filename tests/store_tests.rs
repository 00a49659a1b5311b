//! Locked file store tests
//!
//! Run with: cargo test --test store_tests

use flatstore::audit::{get_change_history, record_change};
use flatstore::{Document, FileStore, Record, StoreError};
use std::fs;
use tempfile::TempDir;

fn record(id: &str, title: &str) -> Record {
    let mut r = Record::new();
    r.set("id", id);
    r.set("title", title);
    r
}

#[tokio::test]
async fn test_read_missing_file_returns_empty_document() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let doc = store.read_document("listings.json").await.unwrap();
    assert!(doc.is_empty());

    // The file is created on first access so the lock guards a real file.
    let contents = fs::read_to_string(dir.path().join("listings.json")).unwrap();
    assert_eq!(contents, "[]");
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let doc: Document = vec![record("1", "Seaside studio"), record("2", "Hill flat")];
    assert!(store.write_document("listings.json", &doc).await.unwrap());

    let read = store.read_document("listings.json").await.unwrap();
    assert_eq!(read, doc);

    // Pretty-printed on disk.
    let contents = fs::read_to_string(dir.path().join("listings.json")).unwrap();
    assert!(contents.starts_with("[\n"));
    assert!(contents.contains("  {"));
}

#[tokio::test]
async fn test_write_backs_up_previous_contents() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let v1: Document = vec![record("1", "Original")];
    store.write_document("listings.json", &v1).await.unwrap();
    let pre_write = fs::read(dir.path().join("listings.json")).unwrap();

    let v2: Document = vec![record("1", "Changed")];
    store.write_document("listings.json", &v2).await.unwrap();

    let backups = store.backups().list("listings.json").unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].filename.starts_with("listings.json.backup."));

    // Backup content equals the pre-write content byte-for-byte.
    let backup_bytes =
        fs::read(store.backups().backup_dir().join(&backups[0].filename)).unwrap();
    assert_eq!(backup_bytes, pre_write);

    // Restoring it brings the live file back to the pre-write bytes.
    assert!(store
        .backups()
        .restore("listings.json", &backups[0].filename)
        .unwrap());
    let live = fs::read(dir.path().join("listings.json")).unwrap();
    assert_eq!(live, pre_write);
    assert_eq!(store.read_document("listings.json").await.unwrap(), v1);
}

#[tokio::test]
async fn test_corrupt_file_is_a_distinct_error() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    fs::write(dir.path().join("bad.json"), "{not json").unwrap();

    let err = store.read_document("bad.json").await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptData { .. }));

    // The lenient variant substitutes an empty document instead.
    let doc = store.read_document_or_empty("bad.json").await.unwrap();
    assert!(doc.is_empty());
}

#[tokio::test]
async fn test_update_document_read_modify_write() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let doc: Document = vec![record("1", "Before")];
    store.write_document("listings.json", &doc).await.unwrap();

    store
        .update_document("listings.json", |doc| {
            doc[0].set("title", "After");
            doc.push(record("2", "New"));
            Ok(())
        })
        .await
        .unwrap();

    let read = store.read_document("listings.json").await.unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].get("title").unwrap(), "After");
}

#[tokio::test]
async fn test_invalid_filenames_rejected() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    for name in ["", "..", "../escape.json", "nested/file.json"] {
        let err = store.read_document(name).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilename(_)), "{name}");
    }
}

#[tokio::test]
async fn test_paginate_over_stored_document() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let doc: Document = (1..=25)
        .map(|i| record(&i.to_string(), &format!("Listing {i}")))
        .collect();
    store.write_document("listings.json", &doc).await.unwrap();

    let read = store.read_document("listings.json").await.unwrap();
    let page = flatstore::paginate(&read, 2, 10);
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.data[0].id(), Some("11"));
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next);
    assert!(page.has_prev);
}

#[tokio::test]
async fn test_audit_trail_survives_persistence() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let mut doc: Document = vec![record("1", "Listed")];
    record_change(
        &mut doc[0],
        "status",
        "draft",
        "listed",
        "u1",
        "Alice",
        Some("published"),
    );
    store.write_document("listings.json", &doc).await.unwrap();

    let read = store.read_document("listings.json").await.unwrap();
    let history = get_change_history(&read[0]);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].field, "status");
    assert_eq!(history[0].changed_by_name, "Alice");
    assert_eq!(history[0].reason.as_deref(), Some("published"));
}
