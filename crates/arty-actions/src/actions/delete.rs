use arty_client::{DeleteParams, DeleteService};
use arty_core::Error;
use tracing::{info, trace};

use crate::error::Result;
use crate::retry::Retrier;

/// Delete every artifact matching `path`
///
/// Resolving the matches and deleting them are separate retried calls, each
/// with a full budget. A pattern matching nothing deletes nothing and
/// succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteAction {
    pub path: String,
    pub recursive: bool,
}

impl DeleteAction {
    pub fn validate(&self) -> Result<()> {
        trace!("validating delete plugin configuration");

        if self.path.is_empty() {
            return Err(Error::missing_field("delete path").into());
        }
        Ok(())
    }

    pub async fn exec<S>(&self, client: &S, retrier: &Retrier) -> Result<()>
    where
        S: DeleteService + ?Sized,
    {
        trace!("running delete with provided configuration");

        let params = DeleteParams {
            pattern: self.path.clone(),
            recursive: self.recursive,
        };
        let params = &params;

        let items = retrier
            .run("search", &self.path, move || async move {
                client.get_paths_to_delete(params).await
            })
            .await?;

        let items = &items;
        let deleted = retrier
            .run("delete", &self.path, move || async move {
                client.delete_files(items).await
            })
            .await?;

        info!(path = %self.path, deleted, "delete complete");
        Ok(())
    }
}
