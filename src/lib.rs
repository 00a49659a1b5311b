// ============================================================================
// Flatstore Library
// ============================================================================

//! File-backed JSON document store for CRUD applications that need durable
//! shared state without a database server.
//!
//! Every collection is one pretty-printed JSON array file. All access goes
//! through [`FileStore`], which serializes reads and writes per file behind
//! an exclusive advisory lock, snapshots the previous contents before every
//! overwrite, and keeps a bounded number of backups. Records carry their own
//! bounded audit trail; pagination and input sanitizers round out the
//! library surface the web layer consumes.
//!
//! Out of scope by design: cross-file transactions, schema enforcement,
//! indexing, and replication.

pub mod audit;
pub mod backup;
pub mod core;
pub mod paginate;
pub mod sanitize;
pub mod store;

// Re-export main types for convenience
pub use crate::core::{BackupInfo, ChangeEntry, Document, Record, Result, StoreError};
pub use backup::BackupManager;
pub use paginate::{paginate, Page, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use store::{FileLock, FileStore, StoreConfig};
