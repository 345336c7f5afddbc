//! Batch scheduler.
//!
//! Runs jobs with bounded concurrency and an optional start delay:
//! normalize → static extraction → (dynamic fallback) → download → record.
//! A job's failure is turned into an outcome record and never stops the batch.

mod batch;
mod context;
mod gate;
mod pipeline;
mod settings;

pub use batch::{run_batch, BatchReport};
pub use context::PipelineContext;
pub use gate::StartGate;
pub use pipeline::process_job;
pub use settings::{BatchSettings, SiteSettings};
