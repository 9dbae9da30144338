use std::time::Duration;

/// Exponential backoff: the delay before retry `n` (0-based) is
/// `initial_delay * 2^n`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(5_000),
        }
    }
}

impl RetryPolicy {
    pub const fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let factor = 1_u32 << retry.min(31);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delays the retry loop will wait, in order, if every attempt fails.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries)
            .map(|retry| self.delay_before_retry(retry))
            .collect()
    }
}

/// Time-to-live for cached reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub default: Duration,
    pub health: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(300),
            health: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_under_the_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_attempts(), 4);
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy {
            max_retries: 6,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_before_retry(3), Duration::from_millis(5000));
        assert_eq!(policy.delay_before_retry(40), Duration::from_millis(5000));
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.total_attempts(), 1);
        assert!(policy.schedule().is_empty());
    }
}
