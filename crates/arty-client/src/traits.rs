//! Client capability traits
//!
//! Each action depends only on the slice of Artifactory it uses, so a test
//! double implements just that slice.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CopyParams, DeleteParams, ImagePromotion, ResultSet, SearchParams, TransferSummary,
    UploadParams,
};

/// Resolve a pattern to concrete artifacts
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<ResultSet>;
}

/// Server-side copy by pattern
#[async_trait]
pub trait CopyService: Send + Sync {
    async fn copy(&self, params: &CopyParams) -> Result<TransferSummary>;
}

/// Two-step delete: resolve, then remove
#[async_trait]
pub trait DeleteService: Send + Sync {
    async fn get_paths_to_delete(&self, params: &DeleteParams) -> Result<ResultSet>;

    /// Remove every item; returns how many were deleted. Items already gone
    /// count as deleted.
    async fn delete_files(&self, items: &ResultSet) -> Result<usize>;
}

/// Upload local files
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload_files(&self, params: &UploadParams) -> Result<TransferSummary>;
}

/// Attach properties to artifacts
#[async_trait]
pub trait PropertyService: Send + Sync {
    /// `properties` is the rendered `name=value;name2=v1,v2` string
    async fn set_properties(
        &self,
        items: &ResultSet,
        properties: &str,
        recursive: bool,
    ) -> Result<usize>;
}

/// Docker image promotion
#[async_trait]
pub trait DockerService: Send + Sync {
    async fn promote_docker_image(&self, promotion: &ImagePromotion) -> Result<()>;
}

/// Everything the plugin needs from Artifactory
pub trait ArtifactoryServices:
    SearchService + CopyService + DeleteService + UploadService + PropertyService + DockerService
{
}

impl<T> ArtifactoryServices for T where
    T: SearchService + CopyService + DeleteService + UploadService + PropertyService + DockerService
{
}
