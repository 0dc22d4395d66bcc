//! Retry policy for transient upload/connection failures.
//!
//! Delay formula: `delay(k) = min(max_delay, initial_delay * multiplier^k) + jitter`,
//! where `jitter` is a random value in `[0, delay * jitter_ratio)`.

use std::time::Duration;

use rand::Rng;

/// Classification of a failure, used to decide whether a retry is worthwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Network-level failure: connection reset, timeout, DNS failure.
    Transient,
    /// Credentials rejected by the remote server. Retrying will not help.
    Authentication,
    /// Remote server rejected the request (permissions, quota, path not found).
    Permanent,
}

/// What the caller should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u32 },
    GiveUp,
}

/// Exponential backoff with jitter, bounded by `max_attempts`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter_ratio: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Decides whether attempt `attempt` (1-indexed, the attempt that just failed)
    /// should be retried given `failure`.
    #[must_use]
    pub fn decide(&self, attempt: u32, failure: FailureType) -> RetryDecision {
        if failure != FailureType::Transient {
            return RetryDecision::GiveUp;
        }
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry {
            attempt: attempt + 1,
        }
    }

    /// Computes the delay to wait before attempt `attempt` (1-indexed, the
    /// attempt about to be made), including jitter.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let base_millis =
            (self.initial_delay.as_millis() as f64) * self.multiplier.powi(exponent as i32);
        let capped_millis = base_millis.min(self.max_delay.as_millis() as f64);

        let jitter_millis = if self.jitter_ratio > 0.0 {
            rand::thread_rng().gen_range(0.0..(capped_millis * self.jitter_ratio))
        } else {
            0.0
        };

        Duration::from_millis((capped_millis + jitter_millis).round() as u64)
    }
}

/// Classifies an error message into a [`FailureType`] using textual heuristics,
/// mirroring what drivers surface from the underlying FTP/SFTP libraries.
#[must_use]
pub fn classify_error(message: &str) -> FailureType {
    let lower = message.to_ascii_lowercase();

    let auth_markers = [
        "authentication failed",
        "permission denied",
        "login incorrect",
        "auth",
        "password",
        "unauthorized",
        "530",
    ];
    if auth_markers.iter().any(|marker| lower.contains(marker)) {
        return FailureType::Authentication;
    }

    let transient_markers = [
        "timed out",
        "timeout",
        "connection reset",
        "connection refused",
        "broken pipe",
        "temporarily unavailable",
        "421",
        "425",
        "426",
        "could not connect",
        "network is unreachable",
    ];
    if transient_markers
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return FailureType::Transient;
    }

    FailureType::Permanent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_error_recognizes_transient_markers() {
        assert_eq!(classify_error("Connection reset by peer"), FailureType::Transient);
        assert_eq!(classify_error("421 Service not available"), FailureType::Transient);
    }

    #[test]
    fn test_classify_error_recognizes_auth_markers() {
        assert_eq!(
            classify_error("530 Login incorrect"),
            FailureType::Authentication
        );
    }

    #[test]
    fn test_classify_error_defaults_to_permanent() {
        assert_eq!(classify_error("550 No such file or directory"), FailureType::Permanent);
    }

    #[test]
    fn test_decide_retries_transient_until_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..Default::default()
        };
        assert_eq!(
            policy.decide(1, FailureType::Transient),
            RetryDecision::Retry { attempt: 2 }
        );
        assert_eq!(
            policy.decide(2, FailureType::Transient),
            RetryDecision::Retry { attempt: 3 }
        );
        assert_eq!(policy.decide(3, FailureType::Transient), RetryDecision::GiveUp);
    }

    #[test]
    fn test_decide_never_retries_non_transient_failures() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.decide(1, FailureType::Authentication), RetryDecision::GiveUp);
        assert_eq!(policy.decide(1, FailureType::Permanent), RetryDecision::GiveUp);
    }

    #[test]
    fn test_delay_for_is_bounded_by_max_delay() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            multiplier: 4.0,
            jitter_ratio: 0.1,
        };
        for attempt in 1..=10 {
            let delay = policy.delay_for(attempt);
            assert!(delay <= Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_delay_for_grows_with_attempt_before_cap() {
        let policy = RetryPolicy {
            jitter_ratio: 0.0,
            max_delay: Duration::from_secs(3600),
            ..Default::default()
        };
        assert!(policy.delay_for(1) < policy.delay_for(2));
        assert!(policy.delay_for(2) < policy.delay_for(3));
    }
}
