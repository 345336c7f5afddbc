use std::time::Duration;

/// What went wrong with a download attempt, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No progress within the stall window, or the connect timed out.
    Timeout,
    /// 429 Too Many Requests or 503 Service Unavailable.
    Throttled,
    /// Refused, reset, unresolvable host, or a body cut short.
    Connection,
    /// Server error other than 503.
    Http5xx(u16),
    /// Fatal: 4xx, bad URL, local disk trouble.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    /// Sleep this long, then make the next attempt.
    RetryAfter(Duration),
}

/// Bounded exponential backoff.
///
/// `max_attempts` counts the first attempt, so a policy built from
/// `retries = 3` makes at most four requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles after each further failure.
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_retries(3, Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl RetryPolicy {
    /// Policy allowing `retries` retries after the first attempt.
    pub fn from_retries(retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            base_delay,
            max_delay,
        }
    }

    /// Number of retries this policy allows after the first attempt.
    pub fn retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    /// Backoff before the attempt following `attempt`: `base * 2^(attempt-1)`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }

    /// What to do after attempt number `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        let transient = !matches!(kind, ErrorKind::Other);
        if transient && attempt < self.max_attempts {
            RetryDecision::RetryAfter(self.backoff(attempt))
        } else {
            RetryDecision::NoRetry
        }
    }
}
