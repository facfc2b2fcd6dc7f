use arty_client::{CopyParams, CopyService};
use arty_core::Error;
use tracing::{info, trace};

use super::require_complete;
use crate::error::Result;
use crate::retry::Retrier;

/// Server-side copy of every artifact matching `path` to `target`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyAction {
    /// Source pattern, `repo/path/name` with wildcards
    pub path: String,
    pub target: String,
    pub flat: bool,
    pub recursive: bool,
}

impl CopyAction {
    pub fn validate(&self) -> Result<()> {
        trace!("validating copy plugin configuration");

        if self.path.is_empty() {
            return Err(Error::missing_field("copy source").into());
        }
        if self.target.is_empty() {
            return Err(Error::missing_field("copy target").into());
        }
        Ok(())
    }

    pub async fn exec<S>(&self, client: &S, retrier: &Retrier) -> Result<()>
    where
        S: CopyService + ?Sized,
    {
        trace!("running copy with provided configuration");

        let params = CopyParams {
            pattern: self.path.clone(),
            target: self.target.clone(),
            recursive: self.recursive,
            flat: self.flat,
        };
        let params = &params;

        let summary = retrier
            .run("copy", &self.path, move || async move {
                require_complete(client.copy(params).await?)
            })
            .await?;

        info!(
            from = %self.path,
            to = %self.target,
            copied = summary.succeeded,
            "copy complete"
        );
        Ok(())
    }
}
