//! Integration tests: full batches against a local fixture site.
//!
//! Each test starts a fixture server, runs jobs through the scheduler with the
//! real curl fetcher and downloader, and checks records, files and request counts.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::site_server::SiteServer;
use swfdl_core::extract::{NetworkObserver, ObserveError, ObservedPage};
use swfdl_core::fetch::CurlFetcher;
use swfdl_core::job::build_jobs;
use swfdl_core::record::{write_index, Status, INDEX_FILENAME};
use swfdl_core::retry::RetryPolicy;
use swfdl_core::scheduler::{run_batch, BatchReport, BatchSettings, PipelineContext, SiteSettings};
use tempfile::tempdir;
use url::Url;

const SWF_BODY: &[u8] = b"FWS\x0a\x10\x00\x00\x00fixture swf body";

fn settings(server: &SiteServer, out_dir: &Path, retries: u32) -> BatchSettings {
    BatchSettings {
        out_dir: out_dir.to_path_buf(),
        site: SiteSettings {
            base_url: Url::parse(server.base_url()).unwrap(),
            user_agent: "swfdl-test".to_string(),
        },
        concurrency: 2,
        delay: Duration::ZERO,
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::from_retries(retries, Duration::from_millis(5), Duration::from_millis(20)),
        use_dynamic_fallback: false,
    }
}

async fn run(settings: BatchSettings, inputs: &[&str]) -> BatchReport {
    let (jobs, invalid) = build_jobs(inputs.iter().copied(), &settings.site.base_url);
    assert!(invalid.is_empty(), "fixture inputs should all be valid");
    let ctx = PipelineContext::new(settings, Arc::new(CurlFetcher));
    run_batch(jobs, Arc::new(ctx), std::future::pending()).await
}

fn game_page(title: &str, player_js: &str) -> String {
    format!(
        "<!doctype html><html><head><title>{title}</title></head>\
         <body><div id=\"player\"></div><script>{player_js}</script></body></html>"
    )
}

fn leftover_parts(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".part"))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn static_page_downloads_swf_and_writes_index() {
    let server = SiteServer::start();
    server.page(
        "/game/18037",
        &game_page("Great Game", "player({ file: '/swf/game18037.swf' });"),
    );
    server.file("/swf/game18037.swf", SWF_BODY.to_vec());
    let out = tempdir().unwrap();

    let report = run(settings(&server, out.path(), 3), &["18037"]).await;

    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.records.len(), 1);
    let rec = &report.records[0];
    assert_eq!(rec.status, Status::Success);
    assert_eq!(rec.game_id, "18037");
    assert_eq!(rec.title, "Great Game");
    assert_eq!(rec.page_url, server.url("/game/18037"));
    assert_eq!(rec.swf_url, server.url("/swf/game18037.swf"));
    let local = out.path().join("game18037.swf");
    assert_eq!(rec.local_path.as_deref(), Some(local.to_string_lossy().as_ref()));
    assert_eq!(std::fs::read(&local).unwrap(), SWF_BODY);
    assert!(leftover_parts(out.path()).is_empty());

    let index = write_index(out.path(), &report.records).unwrap();
    assert_eq!(index, out.path().join(INDEX_FILENAME));
    let text = std::fs::read_to_string(&index).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("game_id,title,page_url,swf_url,local_path,status"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("18037,Great Game,"));
    assert!(row.ends_with(",success"));
    assert_eq!(lines.next(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn page_without_swf_is_not_found_and_writes_nothing() {
    let server = SiteServer::start();
    server.page("/game/99999", &game_page("Missing", "console.log('no player');"));
    let out = tempdir().unwrap();

    let report = run(settings(&server, out.path(), 3), &["99999"]).await;

    let rec = &report.records[0];
    assert_eq!(rec.status, Status::SwfNotFound);
    assert_eq!(rec.title, "Missing");
    assert_eq!(rec.swf_url, "");
    assert!(rec.local_path.is_none());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_game_page_is_not_found_without_retry() {
    let server = SiteServer::start();
    let out = tempdir().unwrap();

    let report = run(settings(&server, out.path(), 3), &["424242"]).await;

    let rec = &report.records[0];
    assert_eq!(rec.status, Status::SwfNotFound);
    assert_eq!(rec.title, "Unknown");
    assert_eq!(server.hits("/game/424242"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn persistent_500_fails_after_all_attempts_and_leaves_no_part() {
    let server = SiteServer::start();
    server.page("/game/500", &game_page("Broken", r#"loadSwf("/swf/broken.swf");"#));
    server.statuses("/swf/broken.swf", &[500], SWF_BODY.to_vec());
    let out = tempdir().unwrap();

    let report = run(settings(&server, out.path(), 2), &["500"]).await;

    let rec = &report.records[0];
    assert_eq!(rec.status, Status::DownloadFailed);
    assert_eq!(rec.swf_url, server.url("/swf/broken.swf"));
    assert!(rec.local_path.is_none());
    assert_eq!(server.hits("/swf/broken.swf"), 3);
    assert!(!out.path().join("broken.swf").exists());
    assert!(leftover_parts(out.path()).is_empty());

    let index = write_index(out.path(), &report.records).unwrap();
    let text = std::fs::read_to_string(index).unwrap();
    assert!(text.lines().nth(1).unwrap().ends_with(",,download failed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn persistent_503_uses_exactly_retries_plus_one_requests() {
    let server = SiteServer::start();
    server.page("/game/503", &game_page("Busy", r#"<embed src="/swf/busy.swf">"#));
    server.statuses("/swf/busy.swf", &[503], SWF_BODY.to_vec());
    let out = tempdir().unwrap();

    let report = run(settings(&server, out.path(), 3), &["503"]).await;

    assert_eq!(report.records[0].status, Status::DownloadFailed);
    assert_eq!(server.hits("/swf/busy.swf"), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_404_is_not_retried() {
    let server = SiteServer::start();
    server.page("/game/404", &game_page("Gone", r#"<object data="/swf/gone.swf"></object>"#));
    let out = tempdir().unwrap();

    let report = run(settings(&server, out.path(), 3), &["404"]).await;

    assert_eq!(report.records[0].status, Status::DownloadFailed);
    assert_eq!(server.hits("/swf/gone.swf"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transient_429_then_success() {
    let server = SiteServer::start();
    server.page("/game/77", &game_page("Flaky", r#"var f = "/data/swf/flaky.swf";"#));
    server.statuses("/data/swf/flaky.swf", &[429, 503, 200], SWF_BODY.to_vec());
    let out = tempdir().unwrap();

    let report = run(settings(&server, out.path(), 3), &["77"]).await;

    assert_eq!(report.records[0].status, Status::Success);
    assert_eq!(server.hits("/data/swf/flaky.swf"), 3);
    assert_eq!(std::fs::read(out.path().join("flaky.swf")).unwrap(), SWF_BODY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_job_gets_one_record_in_input_order() {
    let server = SiteServer::start();
    for id in 1..=6 {
        let path = format!("/game/{id}");
        if id % 2 == 0 {
            server.page(&path, &game_page(&format!("Game {id}"), &format!("loadSwf('/swf/g{id}.swf')")));
            server.file(&format!("/swf/g{id}.swf"), SWF_BODY.to_vec());
        } else {
            server.page(&path, &game_page(&format!("Game {id}"), ""));
        }
    }
    let out = tempdir().unwrap();
    let page_url_input = server.url("/game/4");
    let inputs = ["1", "2", "3", page_url_input.as_str(), "5", "6"];

    let report = run(settings(&server, out.path(), 0), &inputs).await;

    assert_eq!(report.submitted, 6);
    let ids: Vec<_> = report.records.iter().map(|r| r.game_id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5", "6"]);
    assert_eq!(report.count(Status::Success), 3);
    assert_eq!(report.count(Status::SwfNotFound), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_delay_bounds_wall_time() {
    let server = SiteServer::start();
    for id in 1..=4 {
        server.page(&format!("/game/{id}"), &game_page("Empty", ""));
    }
    let out = tempdir().unwrap();
    let delay = Duration::from_millis(60);
    let mut s = settings(&server, out.path(), 0);
    s.concurrency = 1;
    s.delay = delay;

    let start = Instant::now();
    let report = run(s, &["1", "2", "3", "4"]).await;

    assert_eq!(report.records.len(), 4);
    assert!(start.elapsed() >= delay * 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn same_filename_from_two_games_is_disambiguated() {
    let server = SiteServer::start();
    server.page("/game/10", &game_page("A", "loadSwf('/a/game.swf')"));
    server.page("/game/20", &game_page("B", "loadSwf('/b/game.swf')"));
    server.file("/a/game.swf", b"FWS first".to_vec());
    server.file("/b/game.swf", b"FWS second".to_vec());
    let out = tempdir().unwrap();
    let mut s = settings(&server, out.path(), 0);
    s.concurrency = 1;

    let report = run(s, &["10", "20"]).await;

    assert_eq!(report.count(Status::Success), 2);
    assert_eq!(std::fs::read(out.path().join("game.swf")).unwrap(), b"FWS first");
    assert_eq!(std::fs::read(out.path().join("game_20.swf")).unwrap(), b"FWS second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_download_frees_its_filename() {
    let server = SiteServer::start();
    server.page("/game/10", &game_page("A", "loadSwf('/a/game.swf')"));
    server.page("/game/20", &game_page("B", "loadSwf('/b/game.swf')"));
    server.file("/b/game.swf", b"FWS second".to_vec());
    let out = tempdir().unwrap();
    let mut s = settings(&server, out.path(), 0);
    s.concurrency = 1;

    let report = run(s, &["10", "20"]).await;

    assert_eq!(report.records[0].status, Status::DownloadFailed);
    assert_eq!(report.records[1].status, Status::Success);
    assert_eq!(std::fs::read(out.path().join("game.swf")).unwrap(), b"FWS second");
    assert!(!out.path().join("game_20.swf").exists());
}

/// Reports a fixed list of requests for every page.
struct ScriptedObserver {
    requests: Vec<String>,
}

#[async_trait]
impl NetworkObserver for ScriptedObserver {
    async fn observe_network(&self, _url: &str, _timeout: Duration) -> Result<ObservedPage, ObserveError> {
        Ok(ObservedPage {
            request_urls: self.requests.clone(),
            title: Some("Browser Title".to_string()),
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dynamic_fallback_finds_swf_from_network_requests() {
    let server = SiteServer::start();
    server.page("/game/31337", &game_page("Scripted", "boot(atob('...'));"));
    server.file("/cdn/real.swf", SWF_BODY.to_vec());
    let out = tempdir().unwrap();
    let mut s = settings(&server, out.path(), 0);
    s.use_dynamic_fallback = true;

    let observer = Arc::new(ScriptedObserver {
        requests: vec![
            server.url("/static/app.js"),
            server.url("/cdn/real.swf?cache=1"),
            server.url("/cdn/other.swf"),
        ],
    });
    let (jobs, _) = build_jobs(["31337"], &s.site.base_url);
    let ctx = PipelineContext::new(s, Arc::new(CurlFetcher)).with_dynamic(observer);
    let report = run_batch(jobs, Arc::new(ctx), std::future::pending()).await;

    let rec = &report.records[0];
    assert_eq!(rec.status, Status::Success);
    assert_eq!(rec.title, "Scripted");
    assert_eq!(rec.swf_url, server.url("/cdn/real.swf?cache=1"));
    assert_eq!(std::fs::read(out.path().join("real.swf")).unwrap(), SWF_BODY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unavailable_browser_disables_fallback_for_the_batch() {
    struct NoBrowser;

    #[async_trait]
    impl NetworkObserver for NoBrowser {
        async fn observe_network(&self, _: &str, _: Duration) -> Result<ObservedPage, ObserveError> {
            Err(ObserveError::BrowserUnavailable("no chrome in test".to_string()))
        }
    }

    let server = SiteServer::start();
    server.page("/game/1", &game_page("One", ""));
    server.page("/game/2", &game_page("Two", ""));
    let out = tempdir().unwrap();
    let mut s = settings(&server, out.path(), 0);
    s.use_dynamic_fallback = true;
    s.concurrency = 1;

    let (jobs, _) = build_jobs(["1", "2"], &s.site.base_url);
    let ctx = Arc::new(PipelineContext::new(s, Arc::new(CurlFetcher)).with_dynamic(Arc::new(NoBrowser)));
    let report = run_batch(jobs, Arc::clone(&ctx), std::future::pending()).await;

    assert_eq!(report.count(Status::SwfNotFound), 2);
    assert!(ctx.dynamic.as_ref().unwrap().is_disabled());
}
