// ABOUTME: Read: refresh recorded state from the registry.
// ABOUTME: A missing repository or tag is reported as Absent, never as an error.

use super::Reconciler;
use super::context::ReconcileContext;
use super::error::{ReconcileError, RegistryResultExt};
use super::spec::{DesiredImageSpec, ReadOutcome, ResourceState};
use crate::registry::{Registry, RegistryError};
use crate::runtime::ImageBuilder;

impl<R: Registry, B: ImageBuilder> Reconciler<R, B> {
    /// Look up the manifest currently under the resource's tag.
    ///
    /// The recorded fingerprint is carried through unchanged.
    pub async fn read(
        &self,
        ctx: &ReconcileContext,
        spec: &DesiredImageSpec,
        state: &ResourceState,
    ) -> Result<ReadOutcome, ReconcileError> {
        Self::within_deadline(ctx, "read", async {
            let region = ctx.region();
            let repository = &spec.repository;
            let tag = &spec.image_tag;

            let exists = self
                .registry
                .repository_exists(region, repository)
                .await
                .during("check repository")?;
            if !exists {
                tracing::info!(%repository, %region, "repository is gone");
                return Ok(ReadOutcome::Absent);
            }

            // The repository or tag can disappear after each check.
            match self.registry.tag_exists(region, repository, tag).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(%repository, %tag, "tag is gone");
                    return Ok(ReadOutcome::Absent);
                }
                Err(RegistryError::RepositoryNotFound(_)) => {
                    tracing::info!(%repository, %region, "repository is gone");
                    return Ok(ReadOutcome::Absent);
                }
                Err(e) => return Err(e).during("check tag"),
            }

            let id = match self.registry.get_manifest(region, repository, tag).await {
                Ok(manifest) => manifest,
                Err(RegistryError::ImageNotFound(_) | RegistryError::RepositoryNotFound(_)) => {
                    return Ok(ReadOutcome::Absent);
                }
                Err(e) => return Err(e).during("fetch manifest"),
            };

            if id != state.id {
                tracing::info!(%repository, %tag, digest = %id.digest(), "manifest changed outside of ecrbuildpush");
            }

            Ok(ReadOutcome::Present(ResourceState {
                id,
                content_fingerprint: state.content_fingerprint.clone(),
            }))
        })
        .await
    }
}
