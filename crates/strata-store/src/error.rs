/// Errors from backing-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named object does not exist in the bucket.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The named bucket does not exist.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// Bus connectivity or timeout failure from a networked backend.
    /// Never retried at this layer; the caller owns the retry policy.
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error from the underlying backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
