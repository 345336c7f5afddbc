//! Default action: download every given game and write the index.

use anyhow::{Context, Result};
use std::sync::Arc;
use swfdl_core::config::SwfdlConfig;
use swfdl_core::downloader::DownloadProgress;
use swfdl_core::extract::ChromeObserver;
use swfdl_core::fetch::CurlFetcher;
use swfdl_core::job::build_jobs;
use swfdl_core::record::{write_index, Status};
use swfdl_core::scheduler::{run_batch, PipelineContext};

use super::progress;

/// Run one batch and return the process exit code.
pub async fn run_download(cfg: &SwfdlConfig, inputs: Vec<String>) -> Result<i32> {
    let settings = cfg.batch_settings()?;
    std::fs::create_dir_all(&settings.out_dir)
        .with_context(|| format!("create output directory: {}", settings.out_dir.display()))?;

    let (jobs, skipped) = build_jobs(&inputs, &settings.site.base_url);
    for bad in &skipped {
        eprintln!("skipping invalid input: {}", bad.input);
    }

    println!(
        "swfdl: {} game(s) -> {} (concurrency {}, delay {}ms, retries {}, dynamic fallback {})",
        jobs.len(),
        settings.out_dir.display(),
        settings.concurrency,
        settings.delay.as_millis(),
        settings.retry.retries(),
        if settings.use_dynamic_fallback { "on" } else { "off" },
    );

    let out_dir = settings.out_dir.clone();
    let (progress_tx, progress_rx) = tokio::sync::mpsc::channel::<DownloadProgress>(64);
    let printer = progress::spawn_printer(progress_rx);

    let observer = Arc::new(ChromeObserver {
        settle: cfg.browser_settle(),
        executable: cfg.browser.executable.clone(),
        no_sandbox: cfg.browser.no_sandbox,
    });
    let ctx = PipelineContext::new(settings, Arc::new(CurlFetcher))
        .with_dynamic(observer)
        .with_progress(progress_tx);

    let report = run_batch(jobs, Arc::new(ctx), shutdown_signal()).await;

    if report.interrupted {
        // Aborted jobs may still hold a progress sender on a blocking thread.
        printer.abort();
        eprintln!("interrupted; writing index for {} finished game(s)", report.records.len());
    } else {
        let _ = printer.await;
    }

    let index = write_index(&out_dir, &report.records)?;

    println!(
        "done: {} downloaded, {} SWF not found, {} failed, {} skipped",
        report.count(Status::Success),
        report.count(Status::SwfNotFound),
        report.count(Status::DownloadFailed),
        skipped.len(),
    );
    println!("index: {}", index.display());
    Ok(report.exit_code())
}

/// Resolves on Ctrl-C. Never resolves when the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::warn!("Ctrl-C received");
}
