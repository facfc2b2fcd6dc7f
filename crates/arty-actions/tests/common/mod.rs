//! Shared helpers for plugin integration tests
#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arty_actions::{Actions, Plugin, Retrier};
use arty_core::types::{PluginConfig, RetryPolicy, RetryStrategy};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at `server` with API key auth
pub fn test_config(server: &MockServer, action: &str, retries: i64) -> PluginConfig {
    PluginConfig {
        action: action.to_string(),
        url: server.uri(),
        api_key: Some("superSecretAPIKey".to_string()),
        http_client_retries: retries,
        http_client_retry_wait_ms: 1,
        ..Default::default()
    }
}

/// Same budget as `retries` with millisecond waits
pub fn fast_retrier(retries: u32) -> Retrier {
    Retrier::new(retries, Duration::from_millis(1)).with_policy(RetryPolicy {
        strategy: RetryStrategy::FixedDelay,
        initial_delay_ms: 1,
        ..RetryPolicy::for_actions(retries)
    })
}

/// A validated plugin for `action` against `server`
pub fn plugin(server: &MockServer, action: &str, retries: u32, actions: Actions) -> Plugin {
    let mut plugin = Plugin::new(test_config(server, action, retries.into()), actions)
        .with_retrier(fast_retrier(retries));
    plugin.validate().expect("plugin should validate");
    plugin
}

/// AQL search answering with `items` as `(repo, path, name)`
pub async fn mock_aql(server: &MockServer, items: &[(&str, &str, &str)]) {
    let results: Vec<_> = items
        .iter()
        .map(|(repo, path, name)| json!({ "repo": repo, "path": path, "name": name, "type": "file" }))
        .collect();

    Mock::given(method("POST"))
        .and(path("/api/search/aql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(server)
        .await;
}

/// Requests matching `http_method` and `path_pattern` answer `status` for
/// the first `fail_count` calls and 200 afterwards
pub async fn mock_flaky(
    server: &MockServer,
    http_method: &str,
    path_pattern: &str,
    status: u16,
    fail_count: u64,
) {
    Mock::given(method(http_method))
        .and(path_regex(path_pattern))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method(http_method))
        .and(path_regex(path_pattern))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Number of received requests with `http_method`
pub async fn count_requests(server: &MockServer, http_method: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == http_method)
        .count()
}

/// Log lines written while the guard from `install` is alive
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Route this thread's debug-level events into the capture
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines containing every one of `needles`
    pub fn count(&self, needles: &[&str]) -> usize {
        self.contents()
            .lines()
            .filter(|line| needles.iter().all(|needle| line.contains(needle)))
            .count()
    }
}

/// A port with nothing listening on it
pub fn refused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
