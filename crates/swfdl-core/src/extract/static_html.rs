//! Static extraction: ordered pattern rules over raw page HTML.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use url::Url;

use super::{ExtractionResult, Source};
use crate::fetch::{site_headers, FetchError, PageFetcher};

/// Pattern rules in priority order. Each captures a quoted value containing
/// `.swf`; matching is case-insensitive.
///
/// The first rule that matches anywhere in the document wins, even if a
/// lower-priority rule matches earlier in the text. Within a rule, the first
/// occurrence in document order wins.
pub const RULES: [(&str, &str); 5] = [
    ("loader-call", r#"(?i)\bloadSwf\(\s*["']([^"']+\.swf[^"']*)["']"#),
    ("file-property", r#"(?i)\bfile\s*:\s*["']([^"']+\.swf[^"']*)["']"#),
    ("src-attribute", r#"(?i)\bsrc\s*=\s*["']([^"']+\.swf[^"']*)["']"#),
    ("data-attribute", r#"(?i)\bdata\s*=\s*["']([^"']+\.swf[^"']*)["']"#),
    ("asset-path", r#"(?i)["']([^"']*/data/swf/[^"']+\.swf[^"']*)["']"#),
];

fn compiled_rules() -> &'static [(&'static str, Regex)] {
    static COMPILED: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).expect("static rule regex")))
            .collect()
    })
}

fn title_regex() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex"))
}

/// First SWF reference by rule priority: `(rule name, raw captured value)`.
pub fn find_swf_reference(html: &str) -> Option<(&'static str, String)> {
    compiled_rules().iter().find_map(|(name, re)| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| (*name, m.as_str().replace("&amp;", "&")))
    })
}

/// Page `<title>` text with whitespace collapsed; `None` when missing or blank.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = title_regex().captures(html)?.get(1)?.as_str();
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Apply the rules to `html`; a relative match is resolved against `page_url`.
pub fn extract_from_html(html: &str, page_url: &str) -> ExtractionResult {
    let title = extract_title(html);
    match find_swf_reference(html) {
        Some((rule, raw)) => {
            let swf_url = Url::parse(page_url)
                .and_then(|base| base.join(raw.trim()))
                .map(String::from)
                .unwrap_or(raw);
            tracing::debug!(rule, swf_url = %swf_url, "static rule matched");
            ExtractionResult::found(swf_url, title, Source::Static)
        }
        None => ExtractionResult::not_found(title),
    }
}

/// Fetch `page_url` and run the static rules over its body.
///
/// Blocking. Fails only when the page could not be retrieved (transport error
/// or non-2xx status).
pub fn extract_static(
    fetcher: &dyn PageFetcher,
    page_url: &str,
    user_agent: &str,
    referer: &str,
    timeout: Duration,
) -> Result<ExtractionResult, FetchError> {
    let headers = site_headers(user_agent, referer);
    let response = fetcher.fetch(page_url, &headers, timeout)?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url: page_url.to_string(),
            status: response.status,
        });
    }
    Ok(extract_from_html(&response.text(), page_url))
}
