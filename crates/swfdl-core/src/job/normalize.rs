//! Identifier normalization: numeric ID or game page URL → canonical page URL.

use thiserror::Error;
use url::Url;

use super::Job;

/// Input that is neither an all-digit ID nor a game page URL on the site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a game ID or game page URL: {input:?}")]
pub struct InvalidIdentifier {
    pub input: String,
}

/// Canonical page URL for `game_id` on the site at `base`.
pub fn canonical_page_url(base: &Url, game_id: &str) -> String {
    format!("{}/game/{}", base.as_str().trim_end_matches('/'), game_id)
}

/// Normalize a positional argument into a `Job`.
///
/// Accepts an all-digit game ID, or an `http`/`https` URL on the same host as
/// `base` (a `www.` prefix on either side is ignored) whose path starts with
/// `/game/<digits>`. Query, fragment and trailing path segments are dropped.
pub fn normalize(input: &str, base: &Url) -> Result<Job, InvalidIdentifier> {
    let raw = input.trim();
    let invalid = || InvalidIdentifier {
        input: raw.to_string(),
    };

    let game_id = if is_game_id(raw) {
        raw.to_string()
    } else {
        let url = Url::parse(raw).map_err(|_| invalid())?;
        game_id_from_url(&url, base).ok_or_else(invalid)?
    };

    Ok(Job {
        raw_input: raw.to_string(),
        canonical_url: canonical_page_url(base, &game_id),
        game_id,
    })
}

fn is_game_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn game_id_from_url(url: &Url, base: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if !same_site(url, base) {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    if segments.next()? != "game" {
        return None;
    }
    let id = segments.next()?;
    is_game_id(id).then(|| id.to_string())
}

fn same_site(url: &Url, base: &Url) -> bool {
    fn bare(host: &str) -> String {
        let host = host.to_ascii_lowercase();
        host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
    }
    match (url.host_str(), base.host_str()) {
        (Some(a), Some(b)) => bare(a) == bare(b) && url.port() == base.port(),
        _ => false,
    }
}
