//! Backoff policy for vision API calls

use std::time::{Duration, SystemTime};

/// How often and how long to wait before repeating a failed vision request
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff for the first retry, doubled on each further one
    pub base_delay: Duration,
    /// Upper bound for computed backoff
    pub max_delay: Duration,
    /// Upper bound for a server-supplied `Retry-After`
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(20),
            max_retry_after: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Default delays with a custom retry count
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Whether another attempt is allowed after `attempt` (0-based) failed
    #[must_use]
    pub const fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Wait before the retry that follows `attempt`
    ///
    /// A `Retry-After` from the API wins over computed backoff, even when it
    /// exceeds `max_delay`; it is only bounded by `max_retry_after`. Without
    /// one, backoff doubles per attempt up to `max_delay` and gets up to 20%
    /// jitter on top so batches sharing a key do not retry in lockstep.
    #[must_use]
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(wait) = retry_after {
            return wait.min(self.max_retry_after);
        }

        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);

        backoff + backoff.mul_f64(jitter_fraction())
    }
}

/// Pseudo-random fraction in `[0, 0.2)` taken from the clock
fn jitter_fraction() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 200) / 1000.0
}

/// Whether an HTTP status is worth retrying: rate limits (429) and server errors (5xx)
#[must_use]
pub fn is_recoverable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Whether a transport error is worth retrying
#[must_use]
pub fn is_recoverable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Parse a `Retry-After` header value given in whole seconds
///
/// HTTP-date values are not supported and yield `None`.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            max_retry_after: Duration::from_secs(10),
        }
    }

    #[test]
    fn recoverable_statuses() {
        assert!(is_recoverable_status(429));
        assert!(is_recoverable_status(500));
        assert!(is_recoverable_status(503));
        assert!(!is_recoverable_status(400));
        assert!(!is_recoverable_status(401));
        assert!(!is_recoverable_status(200));
    }

    #[test]
    fn parses_retry_after_seconds() {
        assert_eq!(parse_retry_after("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(" 1 "), Some(Duration::from_secs(1)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn allows_retry_up_to_max() {
        let p = policy();
        assert!(p.allows_retry(0));
        assert!(p.allows_retry(1));
        assert!(!p.allows_retry(2));
        assert!(!RetryPolicy::with_max_retries(0).allows_retry(0));
    }

    #[test]
    fn retry_after_beats_backoff_cap() {
        let p = policy();
        assert_eq!(
            p.delay(0, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn retry_after_is_bounded() {
        let p = policy();
        assert_eq!(
            p.delay(0, Some(Duration::from_secs(600))),
            p.max_retry_after
        );
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let p = policy();
        let d0 = p.delay(0, None);
        let d1 = p.delay(1, None);
        let d5 = p.delay(5, None);

        assert!(d0 >= Duration::from_millis(100) && d0 < Duration::from_millis(120), "{d0:?}");
        assert!(d1 >= Duration::from_millis(200) && d1 < Duration::from_millis(240), "{d1:?}");
        assert!(d5 >= Duration::from_millis(300) && d5 < Duration::from_millis(360), "{d5:?}");
    }
}
