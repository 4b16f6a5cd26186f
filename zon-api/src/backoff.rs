use rand::Rng;
use std::time::Duration;

/// Upper bound on the random jitter added to inter-request spacing.
pub const SPACING_JITTER_MAX: Duration = Duration::from_millis(500);

/// Rate-limit configuration supplied by the config layer.
///
/// `min_delay` is the base spacing between any two requests, `max_delay`
/// caps the exponential retry backoff, and `max_retries` bounds how many
/// times a throttled request is re-sent (total attempts = `max_retries + 1`).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

impl RateLimitPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_delay < self.min_delay {
            return Err(format!(
                "rate_limit.max_delay ({:?}) must be >= rate_limit.min_delay ({:?})",
                self.max_delay, self.min_delay
            ));
        }
        Ok(())
    }

    /// Spacing before a first attempt: `min_delay` plus the caller-supplied
    /// jitter, clamped to [`SPACING_JITTER_MAX`]. Applied to every request,
    /// not only after errors, so traffic never bursts.
    pub fn spacing_delay(&self, jitter: Duration) -> Duration {
        self.min_delay + jitter.min(SPACING_JITTER_MAX)
    }

    /// Backoff before retry `attempt` (1-indexed) after a throttling signal:
    /// `min(max_delay, 2^attempt seconds)`. No additional jitter.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        // Checked shift so absurd attempt numbers saturate instead of wrapping.
        let secs = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_secs(secs).min(self.max_delay)
    }
}

/// Sample the spacing jitter: uniform in `[0, SPACING_JITTER_MAX)`.
pub fn sample_spacing_jitter() -> Duration {
    let max_ms = SPACING_JITTER_MAX.as_millis() as u64;
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(min_ms: u64, max_secs: u64, retries: u32) -> RateLimitPolicy {
        RateLimitPolicy {
            min_delay: Duration::from_millis(min_ms),
            max_delay: Duration::from_secs(max_secs),
            max_retries: retries,
        }
    }

    #[test]
    fn retry_delay_is_exponential_in_whole_seconds() {
        let p = policy(0, 60, 3);
        assert_eq!(p.retry_delay(1), Duration::from_secs(2));
        assert_eq!(p.retry_delay(2), Duration::from_secs(4));
        assert_eq!(p.retry_delay(3), Duration::from_secs(8));
        assert_eq!(p.retry_delay(5), Duration::from_secs(32));
    }

    #[test]
    fn retry_delay_caps_at_max_delay() {
        let p = policy(0, 60, 10);
        assert_eq!(p.retry_delay(6), Duration::from_secs(60));
        assert_eq!(p.retry_delay(63), Duration::from_secs(60));
        // Shift overflow saturates rather than wrapping around.
        assert_eq!(p.retry_delay(64), Duration::from_secs(60));
    }

    #[test]
    fn spacing_delay_adds_bounded_jitter() {
        let p = policy(1000, 60, 3);
        assert_eq!(
            p.spacing_delay(Duration::ZERO),
            Duration::from_millis(1000)
        );
        assert_eq!(
            p.spacing_delay(Duration::from_millis(499)),
            Duration::from_millis(1499)
        );
        // Jitter beyond the bound is clamped, never amplified.
        assert_eq!(
            p.spacing_delay(Duration::from_secs(10)),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn sampled_jitter_stays_in_range() {
        for _ in 0..256 {
            let jitter = sample_spacing_jitter();
            assert!(jitter < SPACING_JITTER_MAX);
        }
    }

    #[test]
    fn validate_rejects_inverted_delays() {
        let p = policy(5000, 1, 3);
        assert!(p.validate().is_err());
        assert!(policy(100, 60, 0).validate().is_ok());
    }
}
