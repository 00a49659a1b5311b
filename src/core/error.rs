use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not lock '{path}' after {attempts} attempts")]
    LockContention { path: String, attempts: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt data in '{path}': {source}")]
    CorruptData {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid filename: '{0}'")]
    InvalidFilename(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A locked operation aborted abnormally (e.g. its blocking task
    /// panicked). Also the variant for caller-defined failures inside
    /// `with_lock`/`update_document` closures.
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// True when the error is transient lock contention and the caller
    /// may simply retry later.
    pub fn is_contention(&self) -> bool {
        matches!(self, StoreError::LockContention { .. })
    }
}
