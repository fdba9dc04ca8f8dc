// ABOUTME: Registry write operations.
// ABOUTME: Publish an existing manifest under another tag, delete a tag.

use super::error::RegistryError;
use super::manifest::ImageManifest;
use crate::types::{ImageTag, Region, RepositoryName};
use async_trait::async_trait;

/// Registry writes that do not upload layers.
#[async_trait]
pub trait RegistryMutator: Send + Sync {
    /// Publish an existing manifest under `tag`.
    ///
    /// The registry records a new tag for content it already stores.
    async fn put_manifest(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
        manifest: &ImageManifest,
    ) -> Result<(), RegistryError>;

    /// Remove a tag from the repository.
    ///
    /// Returns `RegistryError::ImageNotFound` when the tag does not exist.
    async fn delete_tag(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<(), RegistryError>;
}
