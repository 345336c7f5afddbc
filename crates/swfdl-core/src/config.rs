use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::retry::RetryPolicy;
use crate::scheduler::{BatchSettings, SiteSettings};

/// Desktop Chrome user agent; the site serves a reduced page to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Retry backoff parameters (`[retry]` section). The attempt count comes from
/// the top-level `retries` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Headless browser used by the dynamic fallback (`[browser]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Time to keep watching network requests after the page loaded.
    pub settle_ms: u64,
    /// Chrome/Chromium binary; None = let the launcher search PATH.
    #[serde(default)]
    pub executable: Option<PathBuf>,
    /// Launch Chrome with `--no-sandbox` (needed when running as root, e.g. in containers).
    #[serde(default)]
    pub no_sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            settle_ms: 2000,
            executable: None,
            no_sandbox: false,
        }
    }
}

/// Global configuration loaded from `~/.config/swfdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwfdlConfig {
    /// Site root; game pages live at `<base_url>/game/<id>`.
    pub base_url: String,
    pub user_agent: String,
    /// Where SWF files and `downloads.csv` are written.
    pub out_dir: PathBuf,
    /// Maximum jobs in flight.
    pub concurrency: usize,
    /// Minimum spacing between job starts, in milliseconds (0 = none).
    pub delay_ms: u64,
    /// Retries per download after the first attempt.
    pub retries: u32,
    /// Per network call timeout in seconds.
    pub timeout_secs: u64,
    /// Try the headless browser when the static rules find nothing.
    pub use_dynamic_fallback: bool,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Default for SwfdlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://oldswf.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            out_dir: PathBuf::from("./swf_downloads"),
            concurrency: 4,
            delay_ms: 0,
            retries: 3,
            timeout_secs: 30,
            use_dynamic_fallback: false,
            retry: RetryConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl SwfdlConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::try_from_secs_f64(self.retry.base_delay_secs.max(0.0))
            .unwrap_or(Duration::from_secs(1));
        RetryPolicy::from_retries(self.retries, base, Duration::from_secs(self.retry.max_delay_secs))
    }

    /// Runtime settings for one batch. Fails only on an unparseable `base_url`.
    pub fn batch_settings(&self) -> Result<BatchSettings> {
        let base_url = Url::parse(self.base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid base_url in config: {}", self.base_url))?;
        Ok(BatchSettings {
            out_dir: self.out_dir.clone(),
            site: SiteSettings {
                base_url,
                user_agent: self.user_agent.clone(),
            },
            concurrency: self.concurrency.max(1),
            delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            retry: self.retry_policy(),
            use_dynamic_fallback: self.use_dynamic_fallback,
        })
    }

    pub fn browser_settle(&self) -> Duration {
        Duration::from_millis(self.browser.settle_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("swfdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SwfdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SwfdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SwfdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
