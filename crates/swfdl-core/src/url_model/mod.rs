//! URL modeling and filename derivation.
//!
//! Derives safe local filenames for SWF downloads from the URL path and
//! resolves collisions between jobs of the same run.

mod path;
mod registry;
mod sanitize;

pub use path::filename_from_url_path;
pub use registry::FilenameRegistry;
pub use sanitize::sanitize_filename_for_linux;

/// Extension every saved file carries.
pub const SWF_EXTENSION: &str = ".swf";

/// Derives a safe filename for saving the SWF at `url`.
///
/// Uses the last path segment of `url` (query and fragment never take part).
/// The result is sanitized for Linux. When the segment is missing or does not
/// end in `.swf`, falls back to `game_<game_id>.swf`.
///
/// # Examples
///
/// - `derive_swf_filename("https://oldswf.com/data/swf/game18037.swf?v=2", "18037")` → `"game18037.swf"`
/// - `derive_swf_filename("https://oldswf.com/play.php?id=7", "7")` → `"game_7.swf"`
pub fn derive_swf_filename(url: &str, game_id: &str) -> String {
    filename_from_url_path(url)
        .map(|raw| sanitize_filename_for_linux(&raw))
        .filter(|name| {
            name.len() > SWF_EXTENSION.len() && name.to_ascii_lowercase().ends_with(SWF_EXTENSION)
        })
        .unwrap_or_else(|| fallback_filename(game_id))
}

/// `game_<id>.swf`, used when the URL does not name a SWF file.
pub fn fallback_filename(game_id: &str) -> String {
    format!("game_{}{}", sanitize_filename_for_linux(game_id), SWF_EXTENSION)
}
