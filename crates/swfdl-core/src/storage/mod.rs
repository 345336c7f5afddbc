//! Disk I/O and file lifecycle.
//!
//! Transfers stream into `<name>.part`; the file is renamed to its final name
//! only after a complete, successful response. Failed attempts remove the
//! temp file so no partial download is left behind under the final name.

mod writer;

pub use writer::PartFile;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `game.swf` → `game.swf.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
