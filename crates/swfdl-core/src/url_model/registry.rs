//! Per-run filename claims so two jobs never write the same local file.

use std::collections::HashSet;
use std::sync::Mutex;

use super::sanitize::NAME_MAX;
use super::SWF_EXTENSION;

/// Names handed out during the current batch.
///
/// The first job to claim a name keeps it until it releases it after a failed
/// download. A later job asking for a held name gets `<stem>_<game_id>.swf`,
/// then `<stem>_<game_id>_2.swf`, and so on; the stem is shortened so the
/// suffixed name stays within NAME_MAX. Files left on disk by earlier runs
/// are overwritten, not disambiguated.
#[derive(Debug, Default)]
pub struct FilenameRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `candidate` for `game_id`, returning the name actually reserved.
    pub fn claim(&self, candidate: &str, game_id: &str) -> String {
        let mut claimed = self
            .claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if claimed.insert(candidate.to_string()) {
            return candidate.to_string();
        }

        let (stem, ext) = split_extension(candidate);
        let mut n = 1u32;
        loop {
            let suffix = if n == 1 {
                format!("_{game_id}{ext}")
            } else {
                format!("_{game_id}_{n}{ext}")
            };
            let name = format!("{}{}", truncate_to(stem, NAME_MAX.saturating_sub(suffix.len())), suffix);
            if claimed.insert(name.clone()) {
                tracing::debug!(candidate, name = %name, "filename collision resolved");
                return name;
            }
            n += 1;
        }
    }

    /// Give `name` back, e.g. after its download failed and no file was written.
    pub fn release(&self, name: &str) {
        let mut claimed = self
            .claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        claimed.remove(name);
    }
}

/// Longest prefix of `s` within `max` bytes, cut on a char boundary.
fn truncate_to(s: &str, max: usize) -> &str {
    let mut end = s.len().min(max);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn split_extension(name: &str) -> (&str, &str) {
    let ext_len = SWF_EXTENSION.len();
    if name.len() > ext_len && name.to_ascii_lowercase().ends_with(SWF_EXTENSION) {
        name.split_at(name.len() - ext_len)
    } else {
        (name, "")
    }
}
