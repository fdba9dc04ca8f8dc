// ABOUTME: Create: build and push an image that has no recorded state yet.
// ABOUTME: Checks toolchain, repository and tag immutability before touching anything.

use super::Reconciler;
use super::context::ReconcileContext;
use super::error::ReconcileError;
use super::spec::{DesiredImageSpec, ResourceState};
use crate::diagnostics::Diagnostics;
use crate::registry::Registry;
use crate::runtime::ImageBuilder;

impl<R: Registry, B: ImageBuilder> Reconciler<R, B> {
    /// Build `spec` and push it to its repository.
    ///
    /// # Errors
    ///
    /// - `ToolchainUnavailable` if the local toolchain does not answer.
    /// - `RepositoryNotFound` if the repository does not exist.
    /// - `ImmutableTagConflict` if the tag exists in an immutable repository.
    ///   Nothing is built in that case.
    /// - Any failure of the build, tag, authentication, push or manifest fetch,
    ///   in that order.
    pub async fn create(
        &self,
        ctx: &ReconcileContext,
        spec: &DesiredImageSpec,
        diagnostics: &mut Diagnostics,
    ) -> Result<ResourceState, ReconcileError> {
        Self::within_deadline(ctx, "create", async {
            tracing::info!(
                repository = %spec.repository,
                tag = %spec.image_tag,
                region = %ctx.region(),
                "creating image"
            );

            self.require_toolchain().await?;
            self.require_repository(ctx, &spec.repository).await?;
            self.guard_immutable_tag(ctx, &spec.repository, &spec.image_tag)
                .await?;

            let state = self.publish(ctx, spec, false, diagnostics).await?;
            tracing::info!(
                repository = %spec.repository,
                tag = %spec.image_tag,
                digest = %state.id.digest(),
                "created image"
            );
            Ok(state)
        })
        .await
    }
}
