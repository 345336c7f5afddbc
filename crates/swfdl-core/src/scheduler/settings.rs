use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;

/// Site identity sent with every request.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Site root; also the referer for page requests.
    pub base_url: Url,
    pub user_agent: String,
}

/// Runtime settings shared read-only by every job of a batch.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub out_dir: PathBuf,
    pub site: SiteSettings,
    /// Maximum jobs in flight (at least 1).
    pub concurrency: usize,
    /// Minimum spacing between consecutive job starts.
    pub delay: Duration,
    /// Per network call.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub use_dynamic_fallback: bool,
}
