//! Error type shared by every storage operation.

use std::io::{self, ErrorKind};
use std::time::Duration;

/// Failure of a facade or backend operation.
///
/// Backend errors propagate to the caller unchanged; the facade and router
/// never translate or retry them.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Neither storage facility is usable in this process.
    #[error("no storage backend is available")]
    BackendUnavailable,

    /// The remote GET did not produce a 200 response.
    #[error("fetch failed for {url}: {reason}")]
    FetchFailed {
        url: String,
        /// HTTP status, when a response was received at all.
        status: Option<u16>,
        reason: String,
    },

    /// No durably stored file has this logical name.
    #[error("file not found: {0}")]
    NotFound(String),

    /// A logical name could not be derived from the input.
    #[error("cannot derive a file name from '{input}': {reason}")]
    InvalidName { input: String, reason: &'static str },

    /// The sandbox region has no room for the write.
    #[error("sandbox quota exceeded: need {requested} bytes, {available} available")]
    QuotaExceeded { requested: u64, available: u64 },

    /// A native suspension point did not complete in time.
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// The configuration file could not be used.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("object store error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Task(e.to_string())
    }
}

impl From<StoreError> for io::Error {
    fn from(e: StoreError) -> Self {
        let kind = match &e {
            StoreError::Io(inner) => return io::Error::new(inner.kind(), e.to_string()),
            StoreError::BackendUnavailable => ErrorKind::Unsupported,
            StoreError::FetchFailed { .. } => ErrorKind::Other,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidName { .. } => ErrorKind::InvalidInput,
            StoreError::QuotaExceeded { .. } => ErrorKind::StorageFull,
            StoreError::Timeout { .. } => ErrorKind::TimedOut,
            StoreError::Config(_) => ErrorKind::InvalidData,
            StoreError::Database(_) | StoreError::Task(_) => ErrorKind::Other,
        };
        io::Error::new(kind, e.to_string())
    }
}
