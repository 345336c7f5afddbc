//! Transfer error type for retry classification.

use thiserror::Error;

/// Error returned by a single transfer attempt (curl failure, HTTP error, or storage failure).
/// Kept separate from `DownloadError` so the retry loop can classify it first.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Disk write or rename failed (e.g. disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}
