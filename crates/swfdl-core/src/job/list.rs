//! Batch input: positional arguments plus line-oriented job files.

use std::path::Path;

use anyhow::{Context, Result};
use url::Url;

use super::normalize::{normalize, InvalidIdentifier};
use super::Job;

/// Split a job file into inputs: one ID or URL per line; blank lines and
/// lines starting with `#` are ignored; surrounding whitespace is trimmed.
pub fn parse_job_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a job file.
pub fn read_job_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read job file: {}", path.display()))?;
    Ok(parse_job_lines(&text))
}

/// Normalize every input, keeping submission order. Invalid inputs are logged
/// and returned separately.
pub fn build_jobs<I, S>(inputs: I, base: &Url) -> (Vec<Job>, Vec<InvalidIdentifier>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut jobs = Vec::new();
    let mut skipped = Vec::new();
    for input in inputs {
        match normalize(input.as_ref(), base) {
            Ok(job) => jobs.push(job),
            Err(e) => {
                tracing::warn!("skipping input: {}", e);
                skipped.push(e);
            }
        }
    }
    (jobs, skipped)
}
