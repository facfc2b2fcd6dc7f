//! Plugin orchestration
//!
//! A run moves `Unvalidated -> Validated -> Executing` and ends in
//! `Succeeded` or `Failed`. Errors from the selected action are returned
//! unchanged.

use arty_client::{ArtifactoryClient, ArtifactoryServices};
use arty_core::types::PluginConfig;
use tracing::{debug, info, trace};

use crate::actions::{ActionKind, Actions};
use crate::error::{PluginError, Result};
use crate::retry::Retrier;

/// Lifecycle of one plugin run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Unvalidated,
    Validated,
    Executing,
    Succeeded,
    Failed,
}

/// One configured Artifactory action
#[derive(Debug, Clone)]
pub struct Plugin {
    config: PluginConfig,
    actions: Actions,
    retrier: Option<Retrier>,
    state: PluginState,
    kind: Option<ActionKind>,
}

impl Plugin {
    pub fn new(config: PluginConfig, actions: Actions) -> Self {
        Self {
            config: config.normalize(),
            actions,
            retrier: None,
            state: PluginState::Unvalidated,
            kind: None,
        }
    }

    /// Use `retrier` instead of the one derived from the configuration
    pub fn with_retrier(mut self, retrier: Retrier) -> Self {
        self.retrier = Some(retrier);
        self
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    /// Validate the configuration, then the selected action
    pub fn validate(&mut self) -> Result<()> {
        trace!("validating plugin configuration");

        self.state = PluginState::Unvalidated;
        self.config.validate()?;
        let kind: ActionKind = self.config.action.parse()?;
        self.actions.validate(kind)?;

        self.kind = Some(kind);
        self.state = PluginState::Validated;
        Ok(())
    }

    /// Build the Artifactory client from the configuration and run the action
    pub async fn exec(&mut self) -> Result<()> {
        if self.state != PluginState::Validated {
            return Err(PluginError::NotValidated);
        }

        let client = match ArtifactoryClient::new(&self.config) {
            Ok(client) => client,
            Err(err) => {
                self.state = PluginState::Failed;
                return Err(err.into());
            }
        };
        debug!(url = %client.base_url(), dry_run = client.is_dry_run(), "created Artifactory client");

        self.exec_with(&client).await
    }

    /// Run the action against `client`
    pub async fn exec_with<S>(&mut self, client: &S) -> Result<()>
    where
        S: ArtifactoryServices + ?Sized,
    {
        let kind = match (self.state, self.kind) {
            (PluginState::Validated, Some(kind)) => kind,
            _ => return Err(PluginError::NotValidated),
        };

        self.state = PluginState::Executing;
        let retrier = self
            .retrier
            .clone()
            .unwrap_or_else(|| Retrier::from_config(&self.config));

        info!(
            action = %kind,
            url = %self.config.url,
            dry_run = self.config.dry_run,
            retries = retrier.policy().retries(),
            "running action"
        );
        let outcome = self.actions.exec(kind, client, &retrier).await;

        self.state = if outcome.is_ok() {
            PluginState::Succeeded
        } else {
            PluginState::Failed
        };
        outcome
    }
}
