//! Errors raised while talking to Artifactory

use arty_core::retry::HttpStatusError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ArtifactoryError>;

/// Errors that can occur when interacting with Artifactory
///
/// Variants split along retryability: connection-level failures, 403, 5xx,
/// and partial transfers are transient; everything else is fatal.
#[derive(Error, Debug)]
pub enum ArtifactoryError {
    /// Request failed below HTTP for a reason other than connect or timeout
    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, DNS failure, or TLS handshake failure
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed (401): {0}")]
    Unauthorized(String),

    #[error("forbidden (403): {0}")]
    Forbidden(String),

    #[error("server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Some items in a batch failed
    #[error("{failed} item(s) failed, {succeeded} succeeded")]
    PartialFailure { succeeded: usize, failed: usize },

    /// A fatal error stopped a batch after some items had gone through
    #[error("{source} (after {succeeded} item(s) succeeded)")]
    Interrupted {
        succeeded: usize,
        source: Box<ArtifactoryError>,
    },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Client certificate or key could not be loaded
    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ArtifactoryError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            500..=599 => Self::Server { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// Failures a fresh connection attempt may fix
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Interrupted { source, .. } => source.is_unauthorized(),
            _ => matches!(self, Self::Unauthorized(_)),
        }
    }

    /// Items of the batch that went through before this error
    pub fn succeeded_items(&self) -> usize {
        match self {
            Self::PartialFailure { succeeded, .. } | Self::Interrupted { succeeded, .. } => {
                *succeeded
            }
            _ => 0,
        }
    }
}

impl From<reqwest::Error> for ArtifactoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ArtifactoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<url::ParseError> for ArtifactoryError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl HttpStatusError for ArtifactoryError {
    fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Server { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Interrupted { source, .. } => source.status_code(),
            _ => None,
        }
    }

    fn is_transient(&self) -> bool {
        if let Self::Interrupted { source, .. } = self {
            return source.is_transient();
        }
        matches!(
            self,
            Self::Transport(_)
                | Self::Timeout(_)
                | Self::Connection(_)
                | Self::PartialFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arty_core::retry::{HttpStatusPredicate, RetryPredicate};

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ArtifactoryError::from_status(401, "bad creds"),
            ArtifactoryError::Unauthorized(_)
        ));
        assert!(matches!(
            ArtifactoryError::from_status(503, "down"),
            ArtifactoryError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ArtifactoryError::from_status(409, "conflict"),
            ArtifactoryError::Api { status: 409, .. }
        ));
    }

    #[test]
    fn test_artifactory_classification() {
        let predicate = HttpStatusPredicate::artifactory();

        assert!(!predicate.should_retry(&ArtifactoryError::Unauthorized("x".into())));
        assert!(predicate.should_retry(&ArtifactoryError::Forbidden("x".into())));
        assert!(predicate.should_retry(&ArtifactoryError::from_status(500, "x")));
        assert!(!predicate.should_retry(&ArtifactoryError::from_status(400, "x")));
        assert!(!predicate.should_retry(&ArtifactoryError::NotFound("x".into())));
        assert!(predicate.should_retry(&ArtifactoryError::Connection("refused".into())));
        assert!(predicate.should_retry(&ArtifactoryError::Timeout("slow".into())));
        assert!(predicate.should_retry(&ArtifactoryError::PartialFailure {
            succeeded: 1,
            failed: 1
        }));
        assert!(!predicate.should_retry(&ArtifactoryError::Parse("x".into())));
        assert!(!predicate.should_retry(&ArtifactoryError::InvalidPattern("x".into())));
        assert!(!predicate.should_retry(&ArtifactoryError::Tls("x".into())));
    }

    #[test]
    fn test_interrupted_keeps_cause_classification() {
        let err = ArtifactoryError::Interrupted {
            succeeded: 2,
            source: Box::new(ArtifactoryError::Unauthorized("token expired".into())),
        };

        assert!(err.is_unauthorized());
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.succeeded_items(), 2);
        assert!(!HttpStatusPredicate::artifactory().should_retry(&err));
        assert_eq!(
            err.to_string(),
            "authentication failed (401): token expired (after 2 item(s) succeeded)"
        );
    }

    #[test]
    fn test_connection_level() {
        assert!(ArtifactoryError::Connection("refused".into()).is_connection_level());
        assert!(ArtifactoryError::Timeout("slow".into()).is_connection_level());
        assert!(!ArtifactoryError::from_status(502, "x").is_connection_level());
    }
}
