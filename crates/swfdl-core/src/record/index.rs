//! Write the index file once, at the end of a batch.
//!
//! A crash mid-batch loses the index (downloaded files stay on disk); the
//! index is written to a temp file and renamed so a reader never sees half of it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::OutcomeRecord;
use crate::storage;

pub const INDEX_FILENAME: &str = "downloads.csv";

pub const INDEX_HEADER: [&str; 6] = ["game_id", "title", "page_url", "swf_url", "local_path", "status"];

/// Write `records` to `<out_dir>/downloads.csv`, replacing any previous index.
pub fn write_index(out_dir: &Path, records: &[OutcomeRecord]) -> Result<PathBuf> {
    let path = out_dir.join(INDEX_FILENAME);
    let temp = storage::temp_path(&path);

    let mut writer = csv::Writer::from_path(&temp)
        .with_context(|| format!("create index file: {}", temp.display()))?;
    if records.is_empty() {
        // serde only emits the header alongside the first row.
        writer.write_record(INDEX_HEADER)?;
    }
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("write index row for game {}", record.game_id))?;
    }
    writer.flush().context("flush index file")?;
    drop(writer);

    std::fs::rename(&temp, &path)
        .with_context(|| format!("rename {} to {}", temp.display(), path.display()))?;
    tracing::info!(rows = records.len(), path = %path.display(), "index written");
    Ok(path)
}
