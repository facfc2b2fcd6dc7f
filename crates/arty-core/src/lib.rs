//! # arty-core
//!
//! Core library for the Artifactory plugin providing:
//! - Plugin configuration types and validation
//! - Error types for configuration and property deserialization
//! - Retry execution engine with policy-based configuration

pub mod error;
pub mod retry;
pub mod types;

pub use error::{Error, Result};
pub use types::{PluginConfig, RetryPolicy, RetryStrategy};
