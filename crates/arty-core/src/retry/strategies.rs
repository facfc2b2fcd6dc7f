//! Retry delay strategies, predicates, and delay overrides
//!
//! A `RetryPredicate` decides whether a failed attempt is worth repeating; a
//! `DelayOverride` may replace the policy's computed wait for specific errors.

use crate::types::{RetryPolicy, RetryStrategy};
use rand::Rng;
use std::time::Duration;

/// Calculate the delay before the next retry attempt
///
/// # Arguments
///
/// * `policy` - The retry policy containing strategy and timing parameters
/// * `attempt` - The attempt that just failed (1-indexed)
/// * `jitter` - Whether to apply random jitter to the delay
///
/// # Example
///
/// ```rust
/// use arty_core::retry::calculate_delay;
/// use arty_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::for_actions(3);
///
/// assert_eq!(calculate_delay(&policy, 1, false).as_secs(), 1);
/// assert_eq!(calculate_delay(&policy, 2, false).as_secs(), 3);
/// assert_eq!(calculate_delay(&policy, 3, false).as_secs(), 5);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let base_delay_ms = match policy.strategy {
        RetryStrategy::FixedDelay => policy.initial_delay_ms,

        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.initial_delay_ms as f64 * multiplier) as u64
        }

        RetryStrategy::IncrementingBackoff => {
            let factor = 1.0 + policy.backoff_multiplier * attempt_index as f64;
            (policy.initial_delay_ms as f64 * factor) as u64
        }
    };

    let capped_delay_ms = base_delay_ms.min(policy.max_delay_ms);

    // Up to 25% extra
    let final_delay_ms = if jitter && capped_delay_ms > 0 {
        let jitter_range = capped_delay_ms / 4;
        let jitter_value = rand::rng().random_range(0..=jitter_range);
        capped_delay_ms.saturating_add(jitter_value)
    } else {
        capped_delay_ms
    };

    Duration::from_millis(final_delay_ms)
}

/// A predicate that determines whether an error should be retried
///
/// # Example
///
/// ```rust
/// use arty_core::retry::RetryPredicate;
/// use std::io::{Error, ErrorKind};
///
/// struct IoRetryPredicate;
///
/// impl RetryPredicate<Error> for IoRetryPredicate {
///     fn should_retry(&self, error: &Error) -> bool {
///         !matches!(error.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied)
///     }
/// }
/// ```
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Determine whether the given error should be retried
    fn should_retry(&self, error: &E) -> bool;
}

/// Every error is retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

/// A trait for errors that may carry an HTTP status
pub trait HttpStatusError {
    /// The HTTP status code, if the error came from a response
    fn status_code(&self) -> Option<u16>;

    /// Whether a status-less error is worth another attempt
    ///
    /// Connection failures and timeouts usually are; local I/O, parse, and
    /// pattern errors are not.
    fn is_transient(&self) -> bool {
        true
    }
}

/// Retries errors whose HTTP status is in a configured set
///
/// Errors without a status defer to `HttpStatusError::is_transient`.
#[derive(Debug, Clone)]
pub struct HttpStatusPredicate {
    retryable_codes: Vec<u16>,
}

impl HttpStatusPredicate {
    /// Artifactory retry set: 403 and every 5xx
    ///
    /// Artifactory answers 403 while sessions and tokens churn; those clear
    /// after a short wait. 401 is never retried.
    pub fn artifactory() -> Self {
        let mut codes = vec![403];
        codes.extend(500..=599);
        Self {
            retryable_codes: codes,
        }
    }

    pub fn is_retryable_code(&self, code: u16) -> bool {
        self.retryable_codes.contains(&code)
    }
}

impl<E: HttpStatusError> RetryPredicate<E> for HttpStatusPredicate {
    fn should_retry(&self, error: &E) -> bool {
        match error.status_code() {
            Some(code) => self.is_retryable_code(code),
            None => error.is_transient(),
        }
    }
}

/// Replaces the policy delay for particular errors
pub trait DelayOverride<E: ?Sized>: Send + Sync {
    /// Delay to use after `attempt` failed with `error`, or `None` for the
    /// policy's own schedule
    fn delay_for(&self, error: &E, attempt: u32) -> Option<Duration>;
}

/// Always use the policy schedule
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDelay;

impl<E: ?Sized> DelayOverride<E> for DefaultDelay {
    fn delay_for(&self, _error: &E, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Incrementing backoff for one HTTP status: `step * attempt`
#[derive(Debug, Clone, Copy)]
pub struct StatusBackoff {
    status: u16,
    step: Duration,
}

impl StatusBackoff {
    pub fn new(status: u16, step: Duration) -> Self {
        Self { status, step }
    }

    /// 403 waits grow by `step` after every attempt
    pub fn forbidden(step: Duration) -> Self {
        Self::new(403, step)
    }
}

impl<E: HttpStatusError> DelayOverride<E> for StatusBackoff {
    fn delay_for(&self, error: &E, attempt: u32) -> Option<Duration> {
        (error.status_code() == Some(self.status)).then(|| self.step.saturating_mul(attempt))
    }
}
