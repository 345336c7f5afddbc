//! Retry loop: run a closure until success or policy says stop.

use std::time::Duration;

use super::classify::classify;
use super::error::TransferError;
use super::policy::{RetryDecision, RetryPolicy};

/// Per-invocation retry bookkeeping. Lives for one `run_with_retry` call.
#[derive(Debug)]
pub struct RetryState {
    /// 1-based number of the attempt about to run (or that just ran).
    pub attempt: u32,
    /// Error of the most recent failed attempt.
    pub last_error: Option<TransferError>,
    /// Delay slept before the current attempt.
    pub next_delay: Duration,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 1,
            last_error: None,
            next_delay: Duration::ZERO,
        }
    }

    fn schedule(&mut self, error: TransferError, delay: Duration) {
        self.last_error = Some(error);
        self.next_delay = delay;
        self.attempt += 1;
    }
}

/// Final failure of a retried operation.
#[derive(Debug)]
pub struct RetryExhausted {
    /// Attempts made, including the first.
    pub attempts: u32,
    /// Error of the last attempt.
    pub error: TransferError,
}

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// `f` receives the 1-based attempt number. On a retryable failure the thread
/// sleeps for the backoff duration, then tries again. Blocking; call from
/// `spawn_blocking` when driven from async code.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Result<T, TransferError>,
{
    let mut state = RetryState::new();
    loop {
        match f(state.attempt) {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(state.attempt, classify(&e)) {
                RetryDecision::NoRetry => {
                    return Err(RetryExhausted {
                        attempts: state.attempt,
                        error: e,
                    })
                }
                RetryDecision::RetryAfter(d) => {
                    tracing::debug!(
                        attempt = state.attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = d.as_millis() as u64,
                        "transfer failed: {}; retrying",
                        e
                    );
                    state.schedule(e, d);
                    std::thread::sleep(state.next_delay);
                }
            },
        }
    }
}
