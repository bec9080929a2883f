//! Exponential backoff schedule and the sleep seam used between attempts.
//!
//! The schedule only computes delays. Deciding *whether* to retry depends on
//! the caller's response classification and lives with the caller.

use async_trait::async_trait;
use std::time::Duration;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of additional attempts after the first call
    pub max_retries: u32,
    /// Base delay, multiplied by `multiplier^attempt`
    pub initial_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Whether to add up to 25% jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Set max retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable jitter.
    #[must_use]
    pub const fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

/// Backoff schedule derived from a [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a retry policy with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Delay before retry number `attempt` (1-based): `initial * multiplier^attempt`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_delay =
            self.config.initial_delay.as_millis() as f64 * self.config.multiplier.powi(exponent);

        let max_ms = self.config.max_delay.as_millis() as f64;

        let jittered = if self.config.jitter {
            let jitter_factor = 1.0 + (rand::random::<f64>() * 0.25);
            base_delay * jitter_factor
        } else {
            base_delay
        };

        // Cap last so jitter never pushes a delay past `max_delay`.
        Duration::from_millis(jittered.min(max_ms) as u64)
    }

    /// Whether another attempt is allowed after `retries_done` retries.
    #[must_use]
    pub const fn has_retries_left(&self, retries_done: u32) -> bool {
        retries_done < self.config.max_retries
    }

    /// Get the maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.config.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Suspension seam for backoff delays.
///
/// Production code sleeps on the tokio timer; tests substitute an
/// implementation that records the requested delays and returns at once.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `delay`. Dropping the future cancels the wait.
    async fn sleep(&self, delay: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay, Duration::from_millis(1000));
        assert!(!config.jitter);
    }

    #[test]
    fn test_delay_doubles_from_first_retry() {
        let policy = RetryPolicy::new(
            RetryConfig::default().with_initial_delay(Duration::from_millis(100)),
        );

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_max_delay_cap() {
        let config = RetryConfig::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(150));
        let policy = RetryPolicy::new(config);

        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(150));
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let config = RetryConfig::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_jitter();
        let policy = RetryPolicy::new(config);

        for _ in 0..50 {
            let delay = policy.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_jitter_never_exceeds_cap() {
        let config = RetryConfig::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(150))
            .with_jitter();
        let policy = RetryPolicy::new(config);

        for _ in 0..200 {
            assert!(policy.delay_for_attempt(3) <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_retry_budget() {
        let policy = RetryPolicy::new(RetryConfig::default().with_max_retries(2));
        assert!(policy.has_retries_left(0));
        assert!(policy.has_retries_left(1));
        assert!(!policy.has_retries_left(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(500)).await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
