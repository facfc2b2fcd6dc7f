//! Retry policy types
//!
//! These types control how remote operations are re-attempted: how many
//! times, and how long to wait between attempts.

/// Longest wait between two transport-level attempts
pub const TRANSPORT_MAX_DELAY_MS: u64 = 30_000;

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,

    /// Retry strategy
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential and incrementing strategies
    pub backoff_multiplier: f64,

    /// Initial delay in milliseconds
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            strategy: RetryStrategy::default(),
            backoff_multiplier: 2.0,
            initial_delay_ms: 1000,
            max_delay_ms: TRANSPORT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Policy wrapped around every action-level remote call
    ///
    /// `retries` extra attempts follow the first one, waiting 1s, 3s, 5s, ...
    /// between them.
    pub fn for_actions(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            strategy: RetryStrategy::IncrementingBackoff,
            backoff_multiplier: 2.0,
            initial_delay_ms: 1000,
            max_delay_ms: u64::MAX,
        }
    }

    /// Policy wrapped around each HTTP request for connection-level failures
    ///
    /// Waits `wait_ms` first, then doubles, never exceeding 30 seconds.
    pub fn for_transport(retries: u32, wait_ms: u64) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            strategy: RetryStrategy::ExponentialBackoff,
            backoff_multiplier: 2.0,
            initial_delay_ms: wait_ms,
            max_delay_ms: TRANSPORT_MAX_DELAY_MS,
        }
    }

    /// Number of attempts after the first one
    pub fn retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Fixed delay between retries
    FixedDelay,

    /// Exponential backoff (default)
    #[default]
    ExponentialBackoff,

    /// `initial * (1 + multiplier * n)` for the n-th retry (0-indexed)
    IncrementingBackoff,
}
