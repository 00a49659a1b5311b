pub mod error;
pub mod types;

pub use error::{Result, StoreError};
pub use types::{BackupInfo, ChangeEntry, Document, Record, CHANGE_HISTORY_FIELD};
