//! The one retry runner every action call goes through
//!
//! 401 fails on the first attempt. 403 and 5xx responses, connection
//! failures, and partial batch failures are retried until the budget runs
//! out. 403 waits `retry_wait * attempt`; everything else follows the policy
//! schedule (1s, 3s, 5s, ... by default).

use std::future::Future;
use std::time::Duration;

use arty_client::ArtifactoryError;
use arty_core::retry::{HttpStatusPredicate, RetryExecutorBuilder, StatusBackoff, TracingObserver};
use arty_core::types::{PluginConfig, RetryPolicy};

use crate::error::{PluginError, Result};

/// Retry budget and schedule for Artifactory operations
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    forbidden_step: Duration,
}

impl Retrier {
    /// `retries` extra attempts after the first one
    pub fn new(retries: u32, forbidden_step: Duration) -> Self {
        Self {
            policy: RetryPolicy::for_actions(retries),
            forbidden_step,
        }
    }

    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(config.retry_budget(), config.retry_wait())
    }

    /// Replace the attempt schedule, keeping the 403 backoff
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` under the Artifactory retry rules
    ///
    /// `operation` and `subject` (usually the path pattern) label the retry
    /// logs and the returned error.
    pub async fn run<T, F, Fut>(&self, operation: &str, subject: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ArtifactoryError>>,
    {
        RetryExecutorBuilder::new()
            .with_policy(self.policy.clone())
            .with_predicate(HttpStatusPredicate::artifactory())
            .with_delay_override(StatusBackoff::forbidden(self.forbidden_step))
            .with_observer(TracingObserver::new(operation).with_subject(subject))
            .with_jitter(false)
            .build()
            .execute(op)
            .await
            .map_err(|err| PluginError::remote(operation, subject, err))
    }
}
