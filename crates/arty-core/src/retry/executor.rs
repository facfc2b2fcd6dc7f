//! Retry execution engine
//!
//! Every retried call site in the workspace goes through `RetryExecutor`, so
//! attempt counting, backoff, and logging cannot drift between them.

use std::error::Error;
use std::future::Future;
use std::time::Instant;

use crate::types::RetryPolicy;

use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{calculate_delay, AlwaysRetry, DefaultDelay, DelayOverride, RetryPredicate};

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use arty_core::retry::{HttpStatusPredicate, RetryExecutorBuilder, StatusBackoff, TracingObserver};
/// use arty_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::for_actions(3))
///     .with_predicate(HttpStatusPredicate::artifactory())
///     .with_delay_override(StatusBackoff::forbidden(Duration::from_millis(500)))
///     .with_observer(TracingObserver::new("copy").with_subject("libs/foo"))
///     .with_jitter(false)
///     .build();
/// ```
pub struct RetryExecutorBuilder<P = AlwaysRetry, O = NoOpObserver, D = DefaultDelay> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    delay_override: D,
    jitter: bool,
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder {
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            predicate: AlwaysRetry,
            observer: NoOpObserver,
            delay_override: DefaultDelay,
            jitter: true,
        }
    }
}

impl<P, O, D> RetryExecutorBuilder<P, O, D> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the predicate that decides whether an error is retried
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O, D> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
            delay_override: self.delay_override,
            jitter: self.jitter,
        }
    }

    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2, D> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            delay_override: self.delay_override,
            jitter: self.jitter,
        }
    }

    /// Replace the policy delay for specific errors
    pub fn with_delay_override<D2>(self, delay_override: D2) -> RetryExecutorBuilder<P, O, D2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            delay_override,
            jitter: self.jitter,
        }
    }

    /// Enable or disable jitter (enabled by default)
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn build(self) -> RetryExecutor<P, O, D> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            delay_override: self.delay_override,
            jitter: self.jitter,
        }
    }
}

/// A retry executor with configurable policy, predicate, observer, and delay override
///
/// Use `RetryExecutorBuilder` to create an instance.
pub struct RetryExecutor<P, O, D = DefaultDelay> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    delay_override: D,
    jitter: bool,
}

impl<P, O, D> RetryExecutor<P, O, D>
where
    O: RetryObserver,
{
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// policy's attempts run out
    ///
    /// Attempts run strictly one after another; the only suspension between
    /// them is the computed sleep.
    pub async fn execute<F, Fut, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + 'static,
        P: RetryPredicate<E>,
        D: DelayOverride<E>,
    {
        let start = Instant::now();
        let mut last_error: Option<E> = None;

        for attempt in 1..=self.policy.max_attempts {
            self.observer
                .on_attempt_start(attempt, self.policy.max_attempts);

            match op().await {
                Ok(result) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(result);
                }
                Err(err) => {
                    if !self.predicate.should_retry(&err) {
                        self.observer.on_cancelled(attempt, Some(&err));
                        return Err(RetryError::non_retryable(attempt, err));
                    }

                    if attempt >= self.policy.max_attempts {
                        self.observer.on_exhausted(attempt, &err);
                        return Err(RetryError::exhausted(attempt, err, start.elapsed()));
                    }

                    let delay = self
                        .delay_override
                        .delay_for(&err, attempt)
                        .unwrap_or_else(|| calculate_delay(&self.policy, attempt, self.jitter));

                    self.observer.on_attempt_failed(attempt, &err, delay);

                    last_error = Some(err);

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        // Only reachable with max_attempts == 0
        Err(RetryError::cancelled(self.policy.max_attempts, last_error))
    }
}
