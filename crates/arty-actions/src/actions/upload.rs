use std::sync::atomic::{AtomicUsize, Ordering};

use arty_client::{UploadParams, UploadService};
use arty_core::Error;
use tracing::{info, trace, warn};

use super::require_complete;
use crate::error::{PluginError, Result};
use crate::retry::Retrier;

/// Upload local files to `path`, one retried call per source pattern
///
/// Uploads are not idempotent across retries: a retry after a partial
/// failure uploads the whole source again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadAction {
    pub sources: Vec<String>,
    /// Target `repo/path`; end it with `/` to upload into a folder
    pub path: String,
    pub flat: bool,
    pub include_dirs: bool,
    pub recursive: bool,
    pub regexp: bool,
    /// `key=value;key2=value2` attached to every uploaded file
    pub build_props: Option<String>,
}

impl UploadAction {
    pub fn validate(&self) -> Result<()> {
        trace!("validating upload plugin configuration");

        if self.path.is_empty() {
            return Err(Error::missing_field("upload path").into());
        }
        if self.sources.is_empty() {
            return Err(Error::missing_field("upload sources").into());
        }
        Ok(())
    }

    pub async fn exec<S>(&self, client: &S, retrier: &Retrier) -> Result<()>
    where
        S: UploadService + ?Sized,
    {
        trace!("running upload with provided configuration");

        if self.sources.len() > 1 && !self.path.ends_with('/') {
            warn!(
                target_path = %self.path,
                sources = self.sources.len(),
                "uploading multiple sources to a target without a trailing '/'; \
                 each source will overwrite the same path"
            );
        }

        let mut uploaded = 0;
        for source in &self.sources {
            let params = UploadParams {
                pattern: source.clone(),
                target: self.path.clone(),
                flat: self.flat,
                include_dirs: self.include_dirs,
                recursive: self.recursive,
                regexp: self.regexp,
                build_props: self.build_props.clone().filter(|props| !props.is_empty()),
            };
            let params = &params;
            // Most files any attempt got through; later attempts may fail
            // outright after an earlier one uploaded part of the source
            let landed = AtomicUsize::new(0);
            let landed_ref = &landed;

            let summary = retrier
                .run("upload", source, move || async move {
                    let outcome = client.upload_files(params).await;
                    let succeeded = match &outcome {
                        Ok(summary) => summary.succeeded,
                        Err(err) => err.succeeded_items(),
                    };
                    landed_ref.fetch_max(succeeded, Ordering::Relaxed);
                    require_complete(outcome?)
                })
                .await
                .inspect_err(|err| {
                    warn_failed_upload(source, err, landed.load(Ordering::Relaxed))
                })?;

            if summary.succeeded == 0 {
                warn!(source = %source, "no files uploaded, nothing matched the source pattern");
            }
            uploaded += summary.succeeded;
        }

        info!(target_path = %self.path, uploaded, "upload complete");
        Ok(())
    }
}

fn warn_failed_upload(source: &str, err: &PluginError, landed: usize) {
    if landed > 0 {
        warn!(
            source = %source,
            uploaded = landed,
            error = %err,
            "some files were uploaded before the upload failed; retries may have \
             re-uploaded and conflicted with them"
        );
    } else {
        warn!(source = %source, error = %err, "upload failed, no files were uploaded");
    }
}
