//! SWF URL extraction.
//!
//! Two strategies: static pattern rules over the raw page HTML, and an
//! optional dynamic fallback that loads the page in a headless browser and
//! watches its network requests. "Nothing found" is a normal result
//! (`Source::None`), not an error.

mod browser;
mod dynamic;
mod static_html;

pub use browser::ChromeObserver;
pub use dynamic::{first_swf_request, DynamicExtractor, NetworkObserver, ObserveError, ObservedPage};
pub use static_html::{extract_from_html, extract_static, extract_title, find_swf_reference, RULES};

/// Which strategy produced the SWF URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Static,
    Dynamic,
    None,
}

/// Outcome of one extraction. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub swf_url: Option<String>,
    pub title: Option<String>,
    pub source: Source,
}

impl ExtractionResult {
    pub fn found(swf_url: String, title: Option<String>, source: Source) -> Self {
        Self {
            swf_url: Some(swf_url),
            title,
            source,
        }
    }

    pub fn not_found(title: Option<String>) -> Self {
        Self {
            swf_url: None,
            title,
            source: Source::None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.swf_url.is_some()
    }
}
