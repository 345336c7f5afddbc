//! Batch downloader for SWF games hosted on oldswf.com-style sites.
//!
//! Pipeline per job: identifier normalization ([`job`]), SWF URL extraction
//! ([`extract`]), streaming download with retry ([`downloader`], [`retry`]),
//! and one row in the `downloads.csv` index ([`record`]). [`scheduler`] runs
//! jobs with bounded concurrency.

pub mod config;
pub mod logging;

pub mod downloader;
pub mod extract;
pub mod fetch;
pub mod job;
pub mod record;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod url_model;
