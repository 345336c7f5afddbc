//! Byte-level progress for running downloads (CLI-friendly).

/// Snapshot of one download's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProgress {
    pub game_id: String,
    /// Bytes written so far in the current attempt.
    pub bytes_done: u64,
    /// Expected size from `Content-Length`, when the server sent one.
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Fraction complete in [0.0, 1.0], if the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_done as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

pub type ProgressSender = tokio::sync::mpsc::Sender<DownloadProgress>;

/// Best-effort send from a blocking transfer callback; dropped when the
/// consumer lags.
pub(crate) fn report(tx: &ProgressSender, game_id: &str, bytes_done: u64, total_bytes: Option<u64>) {
    let _ = tx.try_send(DownloadProgress {
        game_id: game_id.to_string(),
        bytes_done,
        total_bytes,
    });
}
