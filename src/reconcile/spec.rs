// ABOUTME: Desired and recorded state of one image resource.
// ABOUTME: DesiredImageSpec is what the caller asks for; ResourceState is what was last pushed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::registry::ImageManifest;
use crate::types::{ImageName, ImageRef, ImageTag, RegistryHost, RepositoryName};

/// An image built from `build_context/Dockerfile` and pushed as `repository:image_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredImageSpec {
    /// Target repository. It must already exist.
    pub repository: RepositoryName,
    /// Directory containing the `Dockerfile`.
    pub build_context: PathBuf,
    pub image_name: ImageName,
    pub image_tag: ImageTag,
}

impl DesiredImageSpec {
    /// Local image reference, `image_name:image_tag`.
    pub fn local_ref(&self) -> ImageRef {
        ImageRef::local(&self.image_name, &self.image_tag)
    }

    /// Registry reference, `<host>/<repository>:<image_tag>`.
    pub fn remote_ref(&self, host: &RegistryHost) -> ImageRef {
        ImageRef::remote(host, &self.repository, &self.image_tag)
    }
}

/// Identity and build input of the image last pushed for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Manifest of the pushed image.
    pub id: ImageManifest,
    /// Fingerprint of the build input that produced `id`.
    pub content_fingerprint: Fingerprint,
}

/// Result of refreshing a resource against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Present(ResourceState),
    /// Repository or tag is gone; the caller should forget the resource.
    Absent,
}

impl ReadOutcome {
    pub fn is_absent(&self) -> bool {
        matches!(self, ReadOutcome::Absent)
    }
}
