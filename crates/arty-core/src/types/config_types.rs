//! Connection configuration for the Artifactory plugin

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Retry count used when none (or a negative one) is configured
pub const DEFAULT_HTTP_CLIENT_RETRIES: i64 = 3;

/// Minimum wait in milliseconds between transport-level retries
pub const DEFAULT_HTTP_CLIENT_RETRY_WAIT_MS: u64 = 500;

/// Connection parameters and HTTP tuning shared by every action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    /// Action to perform (copy, delete, set-prop, upload, docker-promote)
    #[serde(default)]
    pub action: String,

    /// Base URL of the Artifactory instance
    #[serde(default)]
    pub url: String,

    /// User name for basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[serde(default)]
    pub password: Option<String>,

    /// API key sent as `X-JFrog-Art-Api`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Access token sent as a bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// Skip every mutating request
    #[serde(default)]
    pub dry_run: bool,

    /// Extra attempts after the first one; negative values fall back to the default
    #[serde(default = "default_retries")]
    pub http_client_retries: i64,

    /// Minimum wait between transport-level retries
    #[serde(default = "default_retry_wait_ms")]
    pub http_client_retry_wait_ms: u64,

    /// PEM client certificate for mutual TLS
    #[serde(default)]
    pub client_cert_path: Option<Utf8PathBuf>,

    /// PEM private key matching `client_cert_path`
    #[serde(default)]
    pub client_cert_key_path: Option<Utf8PathBuf>,

    /// Accept any server certificate
    #[serde(default)]
    pub insecure_tls: bool,

    /// Log verbosity for the process
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            action: String::new(),
            url: String::new(),
            username: None,
            password: None,
            api_key: None,
            token: None,
            dry_run: false,
            http_client_retries: default_retries(),
            http_client_retry_wait_ms: default_retry_wait_ms(),
            client_cert_path: None,
            client_cert_key_path: None,
            insecure_tls: false,
            log_level: default_log_level(),
        }
    }
}

fn default_retries() -> i64 {
    DEFAULT_HTTP_CLIENT_RETRIES
}
fn default_retry_wait_ms() -> u64 {
    DEFAULT_HTTP_CLIENT_RETRY_WAIT_MS
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Treat empty strings like absent values
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl PluginConfig {
    /// Return the configuration with its URL ending in `/` and a
    /// non-negative retry count
    pub fn normalize(mut self) -> Self {
        if !self.url.is_empty() && !self.url.ends_with('/') {
            self.url.push('/');
        }
        if self.http_client_retries < 0 {
            tracing::warn!(
                configured = self.http_client_retries,
                fallback = DEFAULT_HTTP_CLIENT_RETRIES,
                "negative http client retries, using default"
            );
            self.http_client_retries = DEFAULT_HTTP_CLIENT_RETRIES;
        }
        self
    }

    /// Verify the configuration is usable before any network call
    pub fn validate(&self) -> Result<()> {
        tracing::trace!("validating config plugin configuration");

        if self.action.is_empty() {
            return Err(Error::missing_field("config action"));
        }

        if self.url.is_empty() {
            return Err(Error::missing_field("config url"));
        }

        if !self.dry_run {
            if self.token().is_none() && self.api_key().is_none() && self.password().is_none() {
                return Err(Error::missing_field("config token, api-key or password"));
            }

            if self.password().is_some() && self.username().is_none() {
                return Err(Error::missing_field("config username"));
            }
        }

        match (&self.client_cert_path, &self.client_cert_key_path) {
            (Some(_), None) => Err(Error::invalid_config(
                "client-cert-path requires client-cert-key-path",
            )),
            (None, Some(_)) => Err(Error::invalid_config(
                "client-cert-key-path requires client-cert-path",
            )),
            _ => Ok(()),
        }
    }

    /// Effective number of retries after the first attempt
    ///
    /// `normalize` resolves negative counts; one that slips through still
    /// maps to the default.
    pub fn retry_budget(&self) -> u32 {
        if self.http_client_retries < 0 {
            return DEFAULT_HTTP_CLIENT_RETRIES as u32;
        }
        u32::try_from(self.http_client_retries).unwrap_or(u32::MAX)
    }

    /// Minimum wait between transport-level retries
    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.http_client_retry_wait_ms)
    }

    pub fn username(&self) -> Option<&str> {
        present(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        present(&self.password)
    }

    pub fn api_key(&self) -> Option<&str> {
        present(&self.api_key)
    }

    pub fn token(&self) -> Option<&str> {
        present(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PluginConfig {
        PluginConfig {
            action: "copy".to_string(),
            url: "https://myarti.com/artifactory".to_string(),
            username: Some("octocat".to_string()),
            password: Some("superSecretPassword".to_string()),
            ..Default::default()
        }
        .normalize()
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_normalize_adds_trailing_slash() {
        let config = valid_config();
        assert_eq!(config.url, "https://myarti.com/artifactory/");

        let again = config.normalize();
        assert_eq!(again.url, "https://myarti.com/artifactory/");
    }

    #[test]
    fn test_missing_url() {
        let config = PluginConfig {
            url: String::new(),
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_missing_action() {
        let config = PluginConfig {
            action: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_all_credentials() {
        let config = PluginConfig {
            username: None,
            password: None,
            api_key: None,
            token: None,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_credentials_count_as_missing() {
        let config = PluginConfig {
            username: Some(String::new()),
            password: Some(String::new()),
            api_key: Some(String::new()),
            token: Some(String::new()),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_requires_username() {
        let config = PluginConfig {
            username: None,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_api_key_or_token_alone() {
        let api_key = PluginConfig {
            username: None,
            password: None,
            api_key: Some("superSecretAPIKey".to_string()),
            ..valid_config()
        };
        assert!(api_key.validate().is_ok());

        let token = PluginConfig {
            username: None,
            password: None,
            token: Some("superSecretToken".to_string()),
            ..valid_config()
        };
        assert!(token.validate().is_ok());
    }

    #[test]
    fn test_dry_run_bypasses_credentials() {
        let config = PluginConfig {
            username: None,
            password: None,
            dry_run: true,
            ..valid_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_cert_requires_key() {
        let config = PluginConfig {
            client_cert_path: Some(Utf8PathBuf::from("/tmp/cert.pem")),
            ..valid_config()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::InvalidConfig { .. }
        ));
    }

    #[test]
    fn test_retry_budget() {
        let config = PluginConfig {
            http_client_retries: 5,
            ..valid_config()
        };
        assert_eq!(config.retry_budget(), 5);

        let zero = PluginConfig {
            http_client_retries: 0,
            ..valid_config()
        };
        assert_eq!(zero.retry_budget(), 0);
    }

    #[test]
    fn test_negative_retry_budget_falls_back() {
        let config = PluginConfig {
            http_client_retries: -1,
            ..valid_config()
        };
        assert_eq!(config.retry_budget(), 3);
    }

    #[test]
    fn test_normalize_resolves_negative_retries_once() {
        let config = PluginConfig {
            http_client_retries: -4,
            ..valid_config()
        }
        .normalize();
        assert_eq!(config.http_client_retries, DEFAULT_HTTP_CLIENT_RETRIES);

        let again = config.clone().normalize();
        assert_eq!(again.http_client_retries, DEFAULT_HTTP_CLIENT_RETRIES);
        assert_eq!(again.retry_budget(), 3);
    }

    #[test]
    fn test_defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.http_client_retries, 3);
        assert_eq!(config.retry_wait(), Duration::from_millis(500));
        assert_eq!(config.log_level, "info");
    }
}
