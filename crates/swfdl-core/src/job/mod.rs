//! Jobs: one requested game page each.
//!
//! Turns positional arguments and batch-file lines into canonical jobs.
//! Inputs that are neither a numeric ID nor a game page URL on the configured
//! site are reported and skipped; they never abort the batch.

mod list;
mod normalize;

pub use list::{build_jobs, parse_job_lines, read_job_file};
pub use normalize::{canonical_page_url, normalize, InvalidIdentifier};

/// One requested game. Immutable once built; consumed once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The ID or URL exactly as given (trimmed).
    pub raw_input: String,
    /// Numeric game ID.
    pub game_id: String,
    /// `<base_url>/game/<game_id>`.
    pub canonical_url: String,
}
