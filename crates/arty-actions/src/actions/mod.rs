//! Action executors
//!
//! Each action validates its own parameters and runs one or more retried
//! client calls. An action only asks for the client traits it uses.

mod copy;
mod delete;
mod docker_promote;
mod set_prop;
mod upload;

use std::fmt;
use std::str::FromStr;

use arty_client::{ArtifactoryError, ArtifactoryServices, TransferSummary};

pub use copy::CopyAction;
pub use delete::DeleteAction;
pub use docker_promote::{DockerPromoteAction, PROMOTED_ON_PROPERTY};
pub use set_prop::SetPropAction;
pub use upload::UploadAction;

use crate::error::Result;
use crate::retry::Retrier;

/// The action a plugin run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Copy,
    Delete,
    SetProp,
    Upload,
    DockerPromote,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Copy,
        ActionKind::Delete,
        ActionKind::SetProp,
        ActionKind::Upload,
        ActionKind::DockerPromote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Copy => "copy",
            ActionKind::Delete => "delete",
            ActionKind::SetProp => "set-prop",
            ActionKind::Upload => "upload",
            ActionKind::DockerPromote => "docker-promote",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = arty_core::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(ActionKind::as_str).collect();
                arty_core::Error::invalid_action(s, &valid)
            })
    }
}

/// Parameters for every action; only the selected one is used
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions {
    pub copy: CopyAction,
    pub delete: DeleteAction,
    pub set_prop: SetPropAction,
    pub upload: UploadAction,
    pub docker_promote: DockerPromoteAction,
}

impl Actions {
    pub fn validate(&mut self, kind: ActionKind) -> Result<()> {
        match kind {
            ActionKind::Copy => self.copy.validate(),
            ActionKind::Delete => self.delete.validate(),
            ActionKind::SetProp => self.set_prop.validate(),
            ActionKind::Upload => self.upload.validate(),
            ActionKind::DockerPromote => self.docker_promote.validate(),
        }
    }

    pub async fn exec<S>(&self, kind: ActionKind, client: &S, retrier: &Retrier) -> Result<()>
    where
        S: ArtifactoryServices + ?Sized,
    {
        match kind {
            ActionKind::Copy => self.copy.exec(client, retrier).await,
            ActionKind::Delete => self.delete.exec(client, retrier).await,
            ActionKind::SetProp => self.set_prop.exec(client, retrier).await,
            ActionKind::Upload => self.upload.exec(client, retrier).await,
            ActionKind::DockerPromote => self.docker_promote.exec(client, retrier).await,
        }
    }
}

/// A batch with failed items is a partial failure, retried like a 5xx
fn require_complete(
    summary: TransferSummary,
) -> std::result::Result<TransferSummary, ArtifactoryError> {
    if summary.failed > 0 {
        return Err(ArtifactoryError::PartialFailure {
            succeeded: summary.succeeded,
            failed: summary.failed,
        });
    }
    Ok(summary)
}
