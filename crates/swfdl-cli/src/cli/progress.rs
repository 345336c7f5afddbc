//! Throttled progress lines on stdout.

use std::collections::HashMap;
use std::time::Instant;

use swfdl_core::downloader::DownloadProgress;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// Print progress from `rx` at most every 500ms per game, plus once when a
/// game's transfer completes. Ends when every sender is dropped.
pub fn spawn_printer(mut rx: Receiver<DownloadProgress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_print: HashMap<String, Instant> = HashMap::new();
        while let Some(p) = rx.recv().await {
            let now = Instant::now();
            let complete = p.total_bytes.is_some_and(|t| p.bytes_done >= t);
            let due = last_print
                .get(&p.game_id)
                .map_or(true, |t| now.duration_since(*t).as_millis() as u64 >= PROGRESS_INTERVAL_MS);
            if due || complete {
                println!("  {}", format_progress(&p));
                last_print.insert(p.game_id.clone(), now);
            }
        }
    })
}

pub fn format_progress(p: &DownloadProgress) -> String {
    let done_kib = p.bytes_done as f64 / 1024.0;
    match (p.total_bytes, p.fraction()) {
        (Some(total), Some(fraction)) => format!(
            "[{}] {:.1} / {:.1} KiB ({:.1}%)",
            p.game_id,
            done_kib,
            total as f64 / 1024.0,
            fraction * 100.0
        ),
        _ => format!("[{}] {:.1} KiB", p.game_id, done_kib),
    }
}
