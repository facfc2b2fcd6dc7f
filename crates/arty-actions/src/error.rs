//! Error types for arty-actions

use arty_client::ArtifactoryError;
use arty_core::retry::RetryError;
use thiserror::Error;

/// Result type alias using arty-actions' error type
pub type Result<T> = std::result::Result<T, PluginError>;

/// Failure of a plugin run
#[derive(Error, Debug)]
pub enum PluginError {
    /// Configuration or action parameters were rejected before any request
    #[error(transparent)]
    Config(#[from] arty_core::Error),

    /// A retried Artifactory operation gave up
    #[error("{operation} {subject} failed: {source}")]
    Remote {
        operation: String,
        subject: String,
        #[source]
        source: RetryError<ArtifactoryError>,
    },

    /// The client could not be constructed
    #[error("unable to create Artifactory client: {0}")]
    Client(#[from] ArtifactoryError),

    /// `exec` was called before a successful `validate`
    #[error("plugin must be validated before it is executed")]
    NotValidated,
}

impl PluginError {
    pub fn remote(
        operation: impl Into<String>,
        subject: impl Into<String>,
        source: RetryError<ArtifactoryError>,
    ) -> Self {
        Self::Remote {
            operation: operation.into(),
            subject: subject.into(),
            source,
        }
    }

    /// The Artifactory error behind a remote failure
    pub fn artifactory_error(&self) -> Option<&ArtifactoryError> {
        match self {
            Self::Remote { source, .. } => source.source_ref(),
            Self::Client(err) => Some(err),
            _ => None,
        }
    }

    /// Attempts made before a remote failure was returned
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Remote { source, .. } => Some(source.attempts()),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
