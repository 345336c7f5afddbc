//! Start gate: spaces consecutive job starts by a fixed delay.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serialises job start times. Each `wait` returns no earlier than `delay`
/// after the previous one returned. Independent of the concurrency limit.
#[derive(Debug)]
pub struct StartGate {
    delay: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl StartGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_start: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        // Held across the sleep so waiters pass one at a time.
        let mut next_start = self.next_start.lock().await;
        if let Some(at) = *next_start {
            tokio::time::sleep_until(at).await;
        }
        *next_start = Some(Instant::now() + self.delay);
    }
}
