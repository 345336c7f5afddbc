//! SWF downloader.
//!
//! One streamed HTTP GET per attempt, written to `<name>.part` and renamed on
//! success. Retries 429/5xx/timeouts/connection errors with exponential backoff
//! via `RetryPolicy`; any other status fails immediately.

mod progress;
mod transfer;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::fetch::site_headers;
use crate::retry::{run_with_retry, RetryPolicy, TransferError};
use crate::storage::PartFile;

pub use progress::{DownloadProgress, ProgressSender};

/// Everything needed to fetch one SWF.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub game_id: String,
    pub swf_url: String,
    /// Game page the SWF was found on; sent as `Referer`.
    pub referer: String,
    pub user_agent: String,
    /// Final local path (the `.part` file sits next to it).
    pub dest: PathBuf,
    /// Per-attempt transfer timeout.
    pub timeout: Duration,
}

/// Transfer failure after the retry budget is spent (or on a non-retryable error).
#[derive(Debug, Error)]
#[error("download of {url} failed after {attempts} attempt(s): {source}")]
pub struct DownloadError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub source: TransferError,
}

/// Download `req.swf_url` to `req.dest`. Returns the final path.
///
/// Blocking; run from `spawn_blocking`. On failure no file exists at
/// `req.dest` or its `.part` path (a file from an earlier run at `req.dest` is
/// left untouched).
pub fn download_swf(
    req: &DownloadRequest,
    policy: &RetryPolicy,
    progress: Option<&ProgressSender>,
) -> Result<PathBuf, DownloadError> {
    let headers = site_headers(&req.user_agent, &req.referer);

    let outcome = run_with_retry(policy, |attempt| {
        tracing::debug!(game_id = %req.game_id, attempt, url = %req.swf_url, "download attempt");
        let mut part = PartFile::create(&req.dest)?;
        match transfer::stream_to(&req.swf_url, &headers, req.timeout, &mut part, |done, total| {
            if let Some(tx) = progress {
                progress::report(tx, &req.game_id, done, total);
            }
        }) {
            Ok(()) => Ok((part, attempt)),
            Err(e) => {
                part.discard();
                Err(e)
            }
        }
    });

    match outcome {
        Ok((part, attempts)) => {
            let bytes = part.written();
            let path = finalize(part, &req.dest).map_err(|source| DownloadError {
                url: req.swf_url.clone(),
                attempts,
                source,
            })?;
            tracing::info!(game_id = %req.game_id, bytes, path = %path.display(), "downloaded");
            Ok(path)
        }
        Err(exhausted) => Err(DownloadError {
            url: req.swf_url.clone(),
            attempts: exhausted.attempts,
            source: exhausted.error,
        }),
    }
}

fn finalize(part: PartFile, dest: &Path) -> Result<PathBuf, TransferError> {
    let temp = part.temp_path().to_path_buf();
    part.finalize().map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        tracing::warn!(dest = %dest.display(), "could not move download into place: {}", e);
        TransferError::Storage(e)
    })
}
