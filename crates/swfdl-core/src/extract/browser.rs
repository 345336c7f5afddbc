//! Headless Chrome implementation of `NetworkObserver` (chromiumoxide / CDP).
//!
//! Each observation launches an isolated browser with its own throwaway
//! profile directory, records every `Network.requestWillBeSent` event while
//! the page loads and settles, then shuts the browser down.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventRequestWillBeSent};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use tempfile::TempDir;

use super::dynamic::{NetworkObserver, ObserveError, ObservedPage};

/// Launches headless Chrome per observation.
#[derive(Debug, Clone)]
pub struct ChromeObserver {
    /// Extra wait after navigation completes, for script-triggered requests.
    pub settle: Duration,
    /// Chrome/Chromium binary; auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Pass `--no-sandbox`; Chrome refuses to start as root otherwise.
    pub no_sandbox: bool,
}

impl Default for ChromeObserver {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            executable: None,
            no_sandbox: false,
        }
    }
}

/// One browser launch. The profile directory is removed when this is dropped,
/// so it must outlive the browser process.
struct Session {
    profile: TempDir,
    config: BrowserConfig,
}

impl ChromeObserver {
    fn browser_config(&self, timeout: Duration, profile: &Path) -> Result<BrowserConfig, String> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(timeout)
            .user_data_dir(profile);
        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build()
    }

    fn prepare_session(&self, timeout: Duration) -> Result<Session, ObserveError> {
        let profile = tempfile::Builder::new()
            .prefix("swfdl-chrome-")
            .tempdir()
            .map_err(|e| ObserveError::Session(format!("create browser profile dir: {}", e)))?;
        // build() only fails when no Chrome binary can be located.
        let config = self
            .browser_config(timeout, profile.path())
            .map_err(ObserveError::BrowserUnavailable)?;
        Ok(Session { profile, config })
    }
}

/// A missing or non-executable binary disables the fallback; anything else
/// (crash on start, launch timeout) only fails the current job.
fn launch_error(e: CdpError) -> ObserveError {
    match &e {
        CdpError::Io(io_err)
            if matches!(io_err.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) =>
        {
            ObserveError::BrowserUnavailable(e.to_string())
        }
        _ => ObserveError::Session(format!("browser launch failed: {}", e)),
    }
}

#[async_trait]
impl NetworkObserver for ChromeObserver {
    async fn observe_network(&self, url: &str, timeout: Duration) -> Result<ObservedPage, ObserveError> {
        let Session { profile, config } = self.prepare_session(timeout)?;
        let (mut browser, mut handler) = Browser::launch(config).await.map_err(launch_error)?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = observe_page(&browser, url, timeout, self.settle).await;

        if let Err(e) = browser.close().await {
            tracing::debug!("closing browser: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();
        if let Err(e) = profile.close() {
            tracing::debug!("removing browser profile: {}", e);
        }

        result
    }
}

async fn observe_page(
    browser: &Browser,
    url: &str,
    timeout: Duration,
    settle: Duration,
) -> Result<ObservedPage, ObserveError> {
    let session = |e: chromiumoxide::error::CdpError| ObserveError::Session(e.to_string());

    let page = browser.new_page("about:blank").await.map_err(session)?;
    page.execute(EnableParams::default()).await.map_err(session)?;
    let mut requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(session)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let collector = tokio::spawn(async move {
        while let Some(event) = requests.next().await {
            if tx.send(event.request.url.clone()).is_err() {
                break;
            }
        }
    });

    match tokio::time::timeout(timeout, page.goto(url)).await {
        Ok(Ok(_)) => tokio::time::sleep(settle.min(timeout)).await,
        Ok(Err(e)) => {
            collector.abort();
            return Err(session(e));
        }
        Err(_) => tracing::debug!(url, "page load timed out; using requests seen so far"),
    }

    let title = page.get_title().await.ok().flatten();
    collector.abort();

    let mut request_urls = Vec::new();
    while let Ok(u) = rx.try_recv() {
        request_urls.push(u);
    }
    if let Err(e) = page.close().await {
        tracing::debug!("closing page: {}", e);
    }

    Ok(ObservedPage { request_urls, title })
}
