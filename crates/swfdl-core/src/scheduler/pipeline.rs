//! One job, end to end: page → SWF URL → file → outcome record.

use std::sync::Arc;

use tokio::task::JoinError;

use crate::downloader::{download_swf, DownloadRequest};
use crate::extract::{extract_static, ExtractionResult};
use crate::job::Job;
use crate::record::OutcomeRecord;
use crate::url_model::derive_swf_filename;

use super::PipelineContext;

/// Run `job` through extraction and download. Every failure is folded into
/// the returned record; nothing here aborts the batch.
pub async fn process_job(ctx: &Arc<PipelineContext>, job: &Job) -> OutcomeRecord {
    tracing::info!(game_id = %job.game_id, url = %job.canonical_url, "job started");

    let static_result = {
        let ctx = Arc::clone(ctx);
        let page_url = job.canonical_url.clone();
        tokio::task::spawn_blocking(move || {
            let site = &ctx.settings.site;
            extract_static(
                ctx.fetcher.as_ref(),
                &page_url,
                &site.user_agent,
                site.base_url.as_str(),
                ctx.settings.timeout,
            )
        })
        .await
    };
    let extraction = match static_result {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            tracing::warn!(game_id = %job.game_id, stage = "fetch", "{}", e);
            return OutcomeRecord::not_found(job, None);
        }
        Err(e) => return blocking_task_lost(job, "fetch", e),
    };

    let extraction = if extraction.is_found() {
        extraction
    } else {
        with_dynamic_fallback(ctx, job, extraction).await
    };

    let Some(swf_url) = extraction.swf_url.clone() else {
        tracing::info!(game_id = %job.game_id, stage = "extract", "no SWF reference found");
        return OutcomeRecord::not_found(job, extraction.title);
    };
    tracing::debug!(game_id = %job.game_id, source = ?extraction.source, swf_url = %swf_url, "SWF located");

    let filename = ctx
        .filenames
        .claim(&derive_swf_filename(&swf_url, &job.game_id), &job.game_id);
    let request = DownloadRequest {
        game_id: job.game_id.clone(),
        swf_url,
        referer: job.canonical_url.clone(),
        user_agent: ctx.settings.site.user_agent.clone(),
        dest: ctx.settings.out_dir.join(&filename),
        timeout: ctx.settings.timeout,
    };

    let download = {
        let ctx = Arc::clone(ctx);
        tokio::task::spawn_blocking(move || {
            download_swf(&request, &ctx.settings.retry, ctx.progress.as_ref())
        })
        .await
    };
    match download {
        Ok(Ok(path)) => OutcomeRecord::success(job, extraction, path.display().to_string()),
        Ok(Err(e)) => {
            tracing::warn!(
                game_id = %job.game_id,
                stage = "download",
                attempts = e.attempts,
                "{}",
                e
            );
            // Nothing was written under this name; let a later job take it.
            ctx.filenames.release(&filename);
            OutcomeRecord::download_failed(job, extraction)
        }
        Err(e) => blocking_task_lost(job, "download", e),
    }
}

/// Ask the browser when static rules came up empty. The static page title is
/// kept when the browser reports none.
async fn with_dynamic_fallback(
    ctx: &PipelineContext,
    job: &Job,
    static_miss: ExtractionResult,
) -> ExtractionResult {
    let Some(dynamic) = ctx.dynamic.as_ref() else {
        return static_miss;
    };
    if !ctx.settings.use_dynamic_fallback || dynamic.is_disabled() {
        return static_miss;
    }

    tracing::debug!(game_id = %job.game_id, "static rules found nothing, trying browser");
    let observed = dynamic
        .extract(&job.game_id, &job.canonical_url, ctx.settings.timeout)
        .await;
    ExtractionResult {
        title: static_miss.title.or(observed.title),
        ..observed
    }
}

/// A blocking stage did not return. Panics are re-raised so the batch records
/// them like any other panicking job.
fn blocking_task_lost(job: &Job, stage: &'static str, e: JoinError) -> OutcomeRecord {
    if e.is_panic() {
        std::panic::resume_unwind(e.into_panic());
    }
    tracing::warn!(game_id = %job.game_id, stage, "blocking task cancelled: {}", e);
    OutcomeRecord::download_failed(job, ExtractionResult::not_found(None))
}
