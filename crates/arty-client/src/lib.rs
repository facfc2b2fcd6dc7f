//! # arty-client
//!
//! The Artifactory client capability used by the plugin's actions:
//! - Capability traits, one per slice of the REST API
//! - `ArtifactoryClient`, a thin reqwest implementation of all of them
//! - Pattern to AQL translation and target path computation
//! - `ArtifactoryError`, classified for the retry engine

pub mod aql;
pub mod client;
pub mod error;
pub mod paths;
pub mod traits;
pub mod transport;
pub mod types;

pub use client::{ArtifactoryClient, Auth};
pub use error::{ArtifactoryError, Result};
pub use traits::{
    ArtifactoryServices, CopyService, DeleteService, DockerService, PropertyService,
    SearchService, UploadService,
};
pub use transport::Transport;
pub use types::{
    CopyParams, DeleteParams, ImagePromotion, ResultItem, ResultSet, SearchParams,
    TransferSummary, UploadParams,
};
