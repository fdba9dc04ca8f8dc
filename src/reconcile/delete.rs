// ABOUTME: Delete: remove the resource's tag from the repository.
// ABOUTME: Local images and unreferenced layers are left alone.

use super::Reconciler;
use super::context::ReconcileContext;
use super::error::{ReconcileError, RegistryResultExt, TagNotFoundSnafu};
use super::spec::DesiredImageSpec;
use crate::registry::{Registry, RegistryError};
use crate::runtime::ImageBuilder;

impl<R: Registry, B: ImageBuilder> Reconciler<R, B> {
    /// Delete the tag `spec` points at.
    ///
    /// # Errors
    ///
    /// - `RepositoryNotFound` if the repository does not exist, including when
    ///   it is removed while the tag is being deleted.
    /// - `TagNotFound` if the tag does not exist.
    pub async fn delete(
        &self,
        ctx: &ReconcileContext,
        spec: &DesiredImageSpec,
    ) -> Result<(), ReconcileError> {
        Self::within_deadline(ctx, "delete", async {
            let repository = &spec.repository;
            let tag = &spec.image_tag;

            self.require_repository(ctx, repository).await?;
            if !self.tag_exists(ctx, repository, tag).await? {
                return TagNotFoundSnafu {
                    repository: repository.clone(),
                    tag: tag.clone(),
                }
                .fail();
            }

            match self.registry.delete_tag(ctx.region(), repository, tag).await {
                Ok(()) => {}
                Err(RegistryError::ImageNotFound(_)) => {
                    return TagNotFoundSnafu {
                        repository: repository.clone(),
                        tag: tag.clone(),
                    }
                    .fail();
                }
                Err(e) => return Err(e).during_in(repository, "delete tag"),
            }

            tracing::info!(%repository, %tag, "deleted image tag");
            Ok(())
        })
        .await
    }
}
