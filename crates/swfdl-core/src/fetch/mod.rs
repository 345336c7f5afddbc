//! HTTP page fetching.
//!
//! Uses the curl crate (libcurl). `PageFetcher` is the narrow capability the
//! static extractor depends on: "fetch(url, headers, timeout) → status + body".
//! All calls block; run them from `spawn_blocking` when driven from async code.

mod parse;

use std::collections::HashMap;
use std::str;
use std::time::Duration;

use thiserror::Error;

pub use parse::{parse_headers, ResponseHeaders};

/// Request headers as name → value.
pub type RequestHeaders = HashMap<String, String>;

/// Identifying headers sent with every request to the site.
pub fn site_headers(user_agent: &str, referer: &str) -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    headers.insert("User-Agent".to_string(), user_agent.to_string());
    headers.insert("Referer".to_string(), referer.to_string());
    headers
}

/// Status, headers and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub headers: ResponseHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Network-level failure of a page fetch. "Page loaded but nothing matched"
/// is not an error and never produces this type.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u32 },
}

/// Capability used by the static extractor.
pub trait PageFetcher: Send + Sync {
    /// GET `url`. Any HTTP status is returned as `Ok`; only transport failures are `Err`.
    fn fetch(
        &self,
        url: &str,
        headers: &RequestHeaders,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError>;
}

/// libcurl-backed fetcher. Follows redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlFetcher;

impl PageFetcher for CurlFetcher {
    fn fetch(
        &self,
        url: &str,
        headers: &RequestHeaders,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let mut easy = prepare_easy(url, headers, timeout).map_err(transport)?;
        // Accept any encoding libcurl can decode.
        easy.accept_encoding("").map_err(transport)?;
        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        header_lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(transport)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(transport)?;
            transfer.perform().map_err(transport)?;
        }

        let status = easy.response_code().map_err(transport)?;
        Ok(HttpResponse {
            status,
            headers: parse_headers(&header_lines),
            body,
        })
    }
}

/// Builds a curl handle with the shared request settings: redirects, timeouts
/// and custom headers. Used by both the page fetcher and the downloader.
pub(crate) fn prepare_easy(
    url: &str,
    custom_headers: &RequestHeaders,
    timeout: Duration,
) -> Result<curl::easy::Easy, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(timeout.min(Duration::from_secs(15)))?;
    easy.timeout(timeout)?;

    let mut list = curl::easy::List::new();
    for (k, v) in custom_headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !custom_headers.is_empty() {
        easy.http_headers(list)?;
    }
    Ok(easy)
}
