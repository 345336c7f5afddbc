//! Outcome records and the `downloads.csv` index.

mod index;
mod recorder;

use serde::Serialize;

use crate::extract::ExtractionResult;
use crate::job::Job;

pub use index::{write_index, INDEX_FILENAME, INDEX_HEADER};
pub use recorder::ResultRecorder;

/// Title written when the page had none.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Final status of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "SWF not found")]
    SwfNotFound,
    #[serde(rename = "download failed")]
    DownloadFailed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::SwfNotFound => "SWF not found",
            Status::DownloadFailed => "download failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the index. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub game_id: String,
    pub title: String,
    pub page_url: String,
    /// Empty when no SWF URL was found.
    pub swf_url: String,
    /// Absent unless the file was downloaded.
    pub local_path: Option<String>,
    pub status: Status,
}

impl OutcomeRecord {
    fn base(job: &Job, title: Option<String>, swf_url: Option<String>, status: Status) -> Self {
        Self {
            game_id: job.game_id.clone(),
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            page_url: job.canonical_url.clone(),
            swf_url: swf_url.unwrap_or_default(),
            local_path: None,
            status,
        }
    }

    pub fn success(job: &Job, extraction: ExtractionResult, local_path: String) -> Self {
        Self {
            local_path: Some(local_path),
            ..Self::base(job, extraction.title, extraction.swf_url, Status::Success)
        }
    }

    pub fn not_found(job: &Job, title: Option<String>) -> Self {
        Self::base(job, title, None, Status::SwfNotFound)
    }

    pub fn download_failed(job: &Job, extraction: ExtractionResult) -> Self {
        Self::base(job, extraction.title, extraction.swf_url, Status::DownloadFailed)
    }
}
