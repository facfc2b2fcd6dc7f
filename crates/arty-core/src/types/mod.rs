//! Type definitions for plugin configuration and retry policies

mod config_types;
mod runtime_config;

pub use config_types::*;
pub use runtime_config::*;
