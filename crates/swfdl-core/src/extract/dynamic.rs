//! Dynamic extraction: observe a page's network requests and pick the first SWF.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use super::{ExtractionResult, Source};

/// Failure of a browser observation session.
#[derive(Debug, Error)]
pub enum ObserveError {
    /// The browser runtime could not be started. Disables the fallback for the run.
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),
    /// The browser started but the page session failed (navigation, CDP error).
    #[error("browser session failed: {0}")]
    Session(String),
}

/// What a browser saw while loading a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedPage {
    /// Every outgoing request URL, in the order observed.
    pub request_urls: Vec<String>,
    pub title: Option<String>,
}

/// Capability: load `url` and report the outgoing requests made while it settles.
#[async_trait]
pub trait NetworkObserver: Send + Sync {
    async fn observe_network(&self, url: &str, timeout: Duration) -> Result<ObservedPage, ObserveError>;
}

/// First URL whose path ends in `.swf` (case-insensitive; query and fragment ignored).
pub fn first_swf_request(urls: &[String]) -> Option<&str> {
    urls.iter().map(String::as_str).find(|u| is_swf_request(u))
}

fn is_swf_request(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase().ends_with(".swf"))
        .unwrap_or(false)
}

/// Browser fallback with batch-wide disable.
///
/// The first `BrowserUnavailable` flips the disabled flag; every later call
/// returns "not found" without touching the browser. Setting the flag twice
/// from racing workers is harmless.
pub struct DynamicExtractor {
    observer: Arc<dyn NetworkObserver>,
    disabled: AtomicBool,
}

impl DynamicExtractor {
    pub fn new(observer: Arc<dyn NetworkObserver>) -> Self {
        Self {
            observer,
            disabled: AtomicBool::new(false),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Observe `page_url` and select the first SWF request.
    ///
    /// Never fails: browser errors are logged and reported as not found.
    pub async fn extract(&self, game_id: &str, page_url: &str, timeout: Duration) -> ExtractionResult {
        if self.is_disabled() {
            return ExtractionResult::not_found(None);
        }

        match self.observer.observe_network(page_url, timeout).await {
            Ok(page) => {
                tracing::debug!(
                    game_id,
                    requests = page.request_urls.len(),
                    "browser session finished"
                );
                match first_swf_request(&page.request_urls) {
                    Some(url) => ExtractionResult::found(url.to_string(), page.title, Source::Dynamic),
                    None => ExtractionResult::not_found(page.title),
                }
            }
            Err(ObserveError::BrowserUnavailable(reason)) => {
                if !self.disabled.swap(true, Ordering::AcqRel) {
                    tracing::error!(
                        "browser unavailable, dynamic fallback disabled for this run: {}",
                        reason
                    );
                }
                ExtractionResult::not_found(None)
            }
            Err(e) => {
                tracing::warn!(game_id, stage = "dynamic", "{}", e);
                ExtractionResult::not_found(None)
            }
        }
    }
}
