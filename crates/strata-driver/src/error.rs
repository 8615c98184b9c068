use strata_store::StoreError;

use crate::writer::SessionState;

/// Errors from driver operations.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// No logical file exists at the given path.
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// The path is not a valid virtual path for this driver.
    #[error("invalid path: {path}")]
    InvalidPath { path: String },

    /// A terminal operation was attempted on a session that already left
    /// the fresh state. Precondition failure; never retried.
    #[error("cannot {op} a session that is already {state}")]
    InvalidState {
        state: SessionState,
        op: &'static str,
    },

    /// Append was requested but the existing object is not a multipart
    /// pointer.
    #[error("cannot append to {path}: existing object is not multipart")]
    NotMultipart { path: String },

    /// Cancel deleted what it could but some shard deletions failed.
    /// Every failure is collected rather than stopping at the first.
    #[error("cancel of {path} left {} shard(s) behind", .failures.len())]
    CancelIncomplete {
        path: String,
        failures: Vec<StoreError>,
    },

    /// Error from the backing store, propagated as-is.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl DriverError {
    /// Map a store-level `NotFound` onto a path-not-found error for `path`;
    /// every other store error passes through.
    pub(crate) fn for_path(err: StoreError, path: &str) -> Self {
        match err {
            StoreError::NotFound(_) => Self::PathNotFound {
                path: path.to_string(),
            },
            other => Self::Store(other),
        }
    }
}

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
