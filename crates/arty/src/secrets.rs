//! Fallback sources for connection settings
//!
//! A value missing from flags and `PARAMETER_*` variables is looked up, in
//! order, in `ARTIFACTORY_<NAME>`, then in a file named `<name>` under each
//! secret directory. Values are trimmed and blanks are ignored.

use std::env;
use std::io::ErrorKind;

use camino::Utf8PathBuf;
use tracing::{debug, warn};

/// Pipeline parameters mounted as files
pub const PARAMETERS_DIR: &str = "/vela/parameters/artifactory";

/// Pipeline secrets mounted as files
pub const SECRETS_DIR: &str = "/vela/secrets/artifactory";

const ENV_PREFIX: &str = "ARTIFACTORY_";

#[derive(Debug, Clone)]
pub struct SecretSources {
    dirs: Vec<Utf8PathBuf>,
    read_env: bool,
}

impl SecretSources {
    pub fn new() -> Self {
        Self::with_dirs(vec![
            Utf8PathBuf::from(PARAMETERS_DIR),
            Utf8PathBuf::from(SECRETS_DIR),
        ])
    }

    pub fn with_dirs(dirs: Vec<Utf8PathBuf>) -> Self {
        Self {
            dirs,
            read_env: true,
        }
    }

    /// Skip the `ARTIFACTORY_*` variables
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Look `name` up in the environment, then in each directory
    pub fn lookup(&self, name: &str) -> Option<String> {
        if self.read_env {
            let var = format!("{}{}", ENV_PREFIX, name.to_uppercase());
            if let Some(value) = env::var(&var).ok().and_then(trimmed) {
                debug!(name, source = %var, "read setting from environment");
                return Some(value);
            }
        }

        for dir in &self.dirs {
            let path = dir.join(name);
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    if let Some(value) = trimmed(content) {
                        debug!(name, source = %path, "read setting from file");
                        return Some(value);
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!(path = %path, error = %err, "unable to read setting file"),
            }
        }
        None
    }

    /// Replace an absent or blank `value` with the looked-up one
    pub fn fill(&self, value: &mut Option<String>, name: &str) {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            *value = self.lookup(name);
        }
    }
}

impl Default for SecretSources {
    fn default() -> Self {
        Self::new()
    }
}

fn trimmed(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
