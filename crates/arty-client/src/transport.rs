//! HTTP transport with connection-level retries
//!
//! Only failures below HTTP (refused connections, DNS, TLS handshakes,
//! timeouts) are retried here. Status codes are returned as errors untouched
//! so that one HTTP response is one attempt for the action-level policy.

use arty_core::retry::{ClosurePredicate, RetryExecutorBuilder, TracingObserver};
use arty_core::types::RetryPolicy;
use reqwest::{Client, RequestBuilder, Response};

use crate::error::{ArtifactoryError, Result};

/// Shared connection pool plus the transport retry policy
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    policy: RetryPolicy,
}

impl Transport {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send a request built by `build`, rebuilding it for every attempt
    ///
    /// Returns the response only when its status is a success.
    pub async fn send<F>(&self, operation: &str, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let build = &build;
        let client = &self.client;

        let response = RetryExecutorBuilder::new()
            .with_policy(self.policy.clone())
            .with_predicate(ClosurePredicate::new(ArtifactoryError::is_connection_level))
            .with_observer(TracingObserver::new(format!("http {}", operation)))
            .build()
            .execute(move || async move { build(client).send().await.map_err(ArtifactoryError::from) })
            .await
            .map_err(|err| {
                err.into_source()
                    .unwrap_or_else(|| ArtifactoryError::Transport("no request attempted".to_string()))
            })?;

        error_for_status(response).await
    }
}

/// Turn a non-success response into the matching error, keeping the body
pub async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("{} {}", status, url)
    } else {
        format!("{} {}: {}", status, url, body.trim())
    };
    Err(ArtifactoryError::from_status(status.as_u16(), message))
}
