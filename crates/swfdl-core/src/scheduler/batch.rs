//! Run a batch of jobs with bounded concurrency.
//!
//! Keeps up to `concurrency` jobs in flight; when one finishes, the next
//! queued job is started until the queue is empty. Outcomes are collected by
//! this loop alone, in submission order.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::extract::ExtractionResult;
use crate::job::Job;
use crate::record::{OutcomeRecord, ResultRecorder, Status};

use super::gate::StartGate;
use super::pipeline::process_job;
use super::PipelineContext;

/// Exit code for a batch stopped by the user (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Result of one batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One record per finished job, in submission order.
    pub records: Vec<OutcomeRecord>,
    /// Jobs handed to the batch.
    pub submitted: usize,
    /// Stopped early by the shutdown signal; `records` may be short.
    pub interrupted: bool,
}

impl BatchReport {
    /// 0 when the batch ran to completion (whatever the per-job outcomes),
    /// 130 when interrupted.
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            EXIT_INTERRUPTED
        } else {
            0
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

/// Run `jobs` to completion or until `shutdown` resolves.
///
/// On shutdown, in-flight jobs are aborted and only outcomes already
/// produced are kept.
pub async fn run_batch<S>(jobs: Vec<Job>, ctx: Arc<PipelineContext>, shutdown: S) -> BatchReport
where
    S: Future<Output = ()>,
{
    let submitted = jobs.len();
    let concurrency = ctx.settings.concurrency.max(1);
    let gate = Arc::new(StartGate::new(ctx.settings.delay));
    let mut recorder = ResultRecorder::new(submitted);
    let mut queue = jobs.iter().cloned().enumerate();
    let mut join_set = tokio::task::JoinSet::new();
    let mut interrupted = false;
    tokio::pin!(shutdown);

    tracing::info!(jobs = submitted, concurrency, delay_ms = ctx.settings.delay.as_millis() as u64, "batch started");

    loop {
        while join_set.len() < concurrency {
            let Some((index, job)) = queue.next() else {
                break;
            };
            let ctx = Arc::clone(&ctx);
            let gate = Arc::clone(&gate);
            join_set.spawn(async move {
                gate.wait().await;
                let record = match AssertUnwindSafe(process_job(&ctx, &job)).catch_unwind().await {
                    Ok(record) => record,
                    Err(panic) => {
                        tracing::error!(
                            game_id = %job.game_id,
                            stage = "task",
                            "job panicked: {}",
                            panic_message(panic.as_ref())
                        );
                        OutcomeRecord::download_failed(&job, ExtractionResult::not_found(None))
                    }
                };
                (index, record)
            });
        }

        if join_set.is_empty() {
            break;
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::warn!(in_flight = join_set.len(), "shutdown requested, aborting in-flight jobs");
                interrupted = true;
                join_set.abort_all();
                while let Some(res) = join_set.join_next().await {
                    if let Ok((index, record)) = res {
                        recorder.record(index, record);
                    }
                }
                break;
            }
            res = join_set.join_next() => match res {
                Some(Ok((index, record))) => recorder.record(index, record),
                Some(Err(e)) => tracing::error!("job task join: {}", e),
                None => break,
            },
        }
    }

    if !interrupted {
        // A task that died outside the panic guard still owes a record.
        for (index, job) in jobs.iter().enumerate() {
            if !recorder.is_recorded(index) {
                recorder.record(index, OutcomeRecord::download_failed(job, ExtractionResult::not_found(None)));
            }
        }
    }

    let records = recorder.into_records();
    tracing::info!(
        recorded = records.len(),
        submitted,
        interrupted,
        "batch finished"
    );
    BatchReport {
        records,
        submitted,
        interrupted,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
