//! CLI for swfdl.

mod batch;
mod progress;

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use swfdl_core::config::{self, SwfdlConfig};
use swfdl_core::job;

/// Download SWF games from oldswf.com by game ID or page URL.
#[derive(Debug, Parser)]
#[command(name = "swfdl")]
#[command(about = "swfdl: batch SWF game downloader", long_about = None)]
pub struct Cli {
    /// Game IDs (e.g. 18037) or game page URLs.
    #[arg(value_name = "GAME")]
    pub games: Vec<String>,

    /// Read more IDs/URLs from a file, one per line (`#` starts a comment line).
    #[arg(long, value_name = "FILE")]
    pub from_file: Option<PathBuf>,

    /// Directory for SWF files and downloads.csv (created if missing).
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Load pages in headless Chrome when static extraction finds nothing.
    #[arg(long)]
    pub dynamic_fallback: bool,

    /// Maximum number of games processed at once.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,

    /// Minimum delay between starting two games, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Retries per download after the first attempt.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Timeout per network request, in seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl Cli {
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        cli.apply_overrides(&mut cfg);

        let inputs = cli.collect_inputs()?;
        if inputs.is_empty() {
            bail!("no games given (pass IDs/URLs or --from-file)");
        }
        batch::run_download(&cfg, inputs).await
    }

    /// Command-line flags take precedence over config.toml.
    pub fn apply_overrides(&self, cfg: &mut SwfdlConfig) {
        if let Some(dir) = &self.out_dir {
            cfg.out_dir = dir.clone();
        }
        if self.dynamic_fallback {
            cfg.use_dynamic_fallback = true;
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n as usize;
        }
        if let Some(ms) = self.delay_ms {
            cfg.delay_ms = ms;
        }
        if let Some(n) = self.retries {
            cfg.retries = n;
        }
        if let Some(secs) = self.timeout {
            cfg.timeout_secs = secs;
        }
    }

    /// Positional games first, then file entries, in order.
    pub fn collect_inputs(&self) -> Result<Vec<String>> {
        let mut inputs: Vec<String> = self
            .games
            .iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        if let Some(path) = &self.from_file {
            inputs.extend(job::read_job_file(path)?);
        }
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests;
