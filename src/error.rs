use thiserror::Error;

/// Failures of the persistent key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Validation failures of an import payload.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("nothing to import")]
    NothingToImport,
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snippet not found: {0}")]
    NotFound(String),
    #[error("target index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error(transparent)]
    Import(#[from] ImportError),
    /// Reading from storage failed.
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] StorageError),
    /// The in-memory collection changed but the write did not reach storage.
    #[error("changes kept in memory but not persisted: {0}")]
    Unpersisted(#[source] StorageError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("a snippet is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = Result<T, StoreError>;
