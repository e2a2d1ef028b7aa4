//! Reconnection policy.

use std::time::Duration;

/// Linear backoff with a hard ceiling on attempts.
///
/// Attempt `n` (1-based) is scheduled `n * base_delay` after the failure that
/// triggered it. Once `max_attempts` attempts have been made in one
/// disconnection episode no further attempt is scheduled.
///
/// # Example
///
/// ```
/// use parley_gateway::ws::ReconnectPolicy;
/// use std::time::Duration;
///
/// let policy = ReconnectPolicy::default();
/// assert_eq!(policy.next_delay(0), Some(Duration::from_secs(1)));
/// assert_eq!(policy.next_delay(4), Some(Duration::from_secs(5)));
/// assert_eq!(policy.next_delay(5), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_DELAY)
    }
}

impl ReconnectPolicy {
    /// Default attempt ceiling.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// Default base delay.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);

    /// Creates a policy.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A policy that never schedules an attempt.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, Self::DEFAULT_BASE_DELAY)
    }

    /// Maximum attempts per disconnection episode.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Returns whether another attempt is allowed after `attempts_so_far`.
    #[must_use]
    pub fn should_retry(&self, attempts_so_far: u32) -> bool {
        attempts_so_far < self.max_attempts
    }

    /// Delay before the 1-based `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Delay before the next attempt, or `None` when the ceiling is reached.
    #[must_use]
    pub fn next_delay(&self, attempts_so_far: u32) -> Option<Duration> {
        self.should_retry(attempts_so_far)
            .then(|| self.delay_for(attempts_so_far + 1))
    }

    /// Total time spent waiting if every attempt fails.
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
