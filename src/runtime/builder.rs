// ABOUTME: Image builder trait for the local container toolchain.
// ABOUTME: Build, tag and push an image; check the toolchain is reachable.

use crate::registry::RegistryAuth;
use crate::types::ImageRef;
use async_trait::async_trait;
use std::path::Path;

/// Summary of a finished push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Layers uploaded by this push.
    pub layers_pushed: usize,
    /// Layers the registry already held.
    pub layers_reused: usize,
}

/// Image operations: build, tag, push.
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Ping the toolchain daemon.
    async fn toolchain_running(&self) -> Result<(), BuilderError>;

    /// Build `image` from the `Dockerfile` in `context`.
    async fn build_image(&self, image: &ImageRef, context: &Path) -> Result<(), BuilderError>;

    /// Add `target` as another name for the local image `source`.
    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), BuilderError>;

    /// Push `image` with credentials that were obtained beforehand.
    async fn push_image(
        &self,
        image: &ImageRef,
        auth: &RegistryAuth,
    ) -> Result<PushReport, BuilderError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("toolchain unavailable: {0}")]
    Unavailable(String),

    #[error("cannot package build context: {0}")]
    Context(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("tag failed: {0}")]
    TagFailed(String),

    #[error("push of {reference} failed after {layers_pushed} layer(s) were uploaded: {message}")]
    PushFailed {
        reference: String,
        message: String,
        layers_pushed: usize,
    },
}

impl BuilderError {
    /// Layers uploaded before a push failed. Reused layers are not counted.
    pub fn layers_pushed(&self) -> Option<usize> {
        match self {
            BuilderError::PushFailed { layers_pushed, .. } => Some(*layers_pushed),
            _ => None,
        }
    }
}
