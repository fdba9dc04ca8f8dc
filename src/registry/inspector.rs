// ABOUTME: Read-only registry queries.
// ABOUTME: Repository existence, tag existence, tag mutability and manifest lookup.

use super::error::RegistryError;
use super::manifest::ImageManifest;
use crate::types::{ImageTag, Region, RepositoryName};
use async_trait::async_trait;
use std::fmt;

/// Repository-wide policy for re-pointing existing tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMutability {
    Mutable,
    Immutable,
}

impl TagMutability {
    pub fn is_immutable(self) -> bool {
        self == TagMutability::Immutable
    }
}

impl fmt::Display for TagMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagMutability::Mutable => write!(f, "MUTABLE"),
            TagMutability::Immutable => write!(f, "IMMUTABLE"),
        }
    }
}

/// Registry queries against the registry of `region`. Nothing is cached.
#[async_trait]
pub trait RegistryInspector: Send + Sync {
    /// Check whether the repository exists.
    async fn repository_exists(
        &self,
        region: &Region,
        repository: &RepositoryName,
    ) -> Result<bool, RegistryError>;

    /// Fetch the repository's tag mutability setting.
    async fn repository_mutability(
        &self,
        region: &Region,
        repository: &RepositoryName,
    ) -> Result<TagMutability, RegistryError>;

    /// Check whether a tag exists in the repository.
    ///
    /// Returns `RegistryError::RepositoryNotFound` when the repository is gone.
    async fn tag_exists(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<bool, RegistryError>;

    /// Fetch the manifest a tag points at.
    async fn get_manifest(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<ImageManifest, RegistryError>;
}
