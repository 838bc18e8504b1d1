//! Error types for sync operations
//!
//! A closed taxonomy: every failure a store or the engine can produce maps
//! to exactly one variant, so callers can match exhaustively. Transport
//! failures (DNS, TLS, timeouts) all collapse into `StoreUnavailable`.

use thiserror::Error;

/// Errors from the sync engine and object stores
#[derive(Error, Debug)]
pub enum SyncError {
    /// The requested path does not exist (or names a directory)
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// The request was malformed before it reached the store
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A conditional write lost a race with another writer.
    ///
    /// Nothing was applied; the caller must re-read and retry the whole
    /// sequence if it still wants the write.
    #[error("concurrent modification: {0}")]
    ConcurrencyConflict(String),

    /// The store could not be reached or answered outside its contract
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl SyncError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// True for conflicts a caller may resolve by re-reading and retrying
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's Display includes the URL but never credentials
        Self::StoreUnavailable(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
