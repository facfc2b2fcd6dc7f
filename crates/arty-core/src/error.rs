//! Error types for arty-core

use thiserror::Error;

/// Result type alias using arty-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and validation errors
///
/// Every variant is detected before any network call is made and is never
/// retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing required field
    #[error("no {field} provided")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Unknown action name
    #[error("invalid action provided: {action} (Valid actions: {valid})")]
    InvalidAction { action: String, valid: String },

    /// A property record failed validation
    #[error("invalid set-prop prop provided: {message}")]
    InvalidProperty { message: String },

    /// Raw property specification could not be deserialized
    #[error("unable to parse props: {0}")]
    PropertyParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid action error listing the accepted names
    pub fn invalid_action(action: impl Into<String>, valid: &[&str]) -> Self {
        Self::InvalidAction {
            action: action.into(),
            valid: valid.join(", "),
        }
    }

    /// Create an invalid property error
    pub fn invalid_property(message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            message: message.into(),
        }
    }
}
