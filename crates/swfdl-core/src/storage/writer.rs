//! Sequential writer for `.part` download files.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::temp_path;

/// Temp file for one transfer attempt. Data is appended in arrival order;
/// `finalize` renames it into place, `discard` deletes it.
pub struct PartFile {
    file: BufWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create (or truncate) `<final_path>.part`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            file: BufWriter::new(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Append a chunk of the response body.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Bytes appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, sync and rename the temp file to the final path.
    pub fn finalize(self) -> io::Result<PathBuf> {
        let file = self.file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&self.temp_path, &self.final_path)?;
        Ok(self.final_path)
    }

    /// Drop the temp file. Best-effort; a leftover `.part` is harmless.
    pub fn discard(self) {
        let temp_path = self.temp_path;
        drop(self.file);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            tracing::debug!(path = %temp_path.display(), "could not remove temp file: {}", e);
        }
    }
}
