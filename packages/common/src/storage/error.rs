use thiserror::Error;

/// Errors that can occur during file storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The provided storage path is not a safe relative path.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
