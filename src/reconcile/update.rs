// ABOUTME: Update: apply a planned tag change and content drift.
// ABOUTME: Tag changes retag the existing manifest; content drift rebuilds under the current tag.

use super::Reconciler;
use super::context::ReconcileContext;
use super::error::{
    ImmutableTagConflictSnafu, ManifestNotFoundSnafu, ReconcileError, RegistryResultExt,
    ReplacementRequiredSnafu, StaleTagReferenceSnafu,
};
use super::plan::{TagChange, UpdatePlan};
use super::spec::{DesiredImageSpec, ResourceState};
use crate::diagnostics::{Diagnostics, Warning};
use crate::registry::{ImageManifest, Registry, RegistryError};
use crate::runtime::ImageBuilder;
use crate::types::{ImageTag, RepositoryName};

impl<R: Registry, B: ImageBuilder> Reconciler<R, B> {
    /// Converge `state` towards `new_spec` following `plan`.
    ///
    /// An empty plan returns `state` without contacting the registry or the
    /// toolchain. A tag change is applied first; content drift is then
    /// rebuilt and pushed under the new tag.
    ///
    /// A retag that already happened is not repeated: when the old tag is gone
    /// and the new tag holds the recorded manifest, the update carries on with
    /// the rebuild. Retrying after a failed rebuild therefore needs no refresh.
    ///
    /// # Errors
    ///
    /// - `ReplacementRequired` if the repository changed.
    /// - `StaleTagReference` if the recorded tag no longer exists and the new
    ///   tag does not hold the recorded manifest.
    /// - `ImmutableTagConflict` if the new tag already exists in an immutable
    ///   repository. The old tag is left intact.
    /// - Any failure of the rebuild, as for `create`.
    pub async fn update(
        &self,
        ctx: &ReconcileContext,
        old_spec: &DesiredImageSpec,
        state: &ResourceState,
        new_spec: &DesiredImageSpec,
        plan: &UpdatePlan,
        diagnostics: &mut Diagnostics,
    ) -> Result<ResourceState, ReconcileError> {
        if plan.is_noop() {
            tracing::debug!(repository = %new_spec.repository, tag = %new_spec.image_tag, "nothing to update");
            return Ok(state.clone());
        }
        if let Some(change) = plan.repository_change() {
            return ReplacementRequiredSnafu {
                from: change.from.clone(),
                to: change.to.clone(),
            }
            .fail();
        }

        Self::within_deadline(ctx, "update", async {
            let mut current = state.clone();

            if let Some(change) = plan.tag_change() {
                current.id = self
                    .retag(ctx, &new_spec.repository, change, &state.id, diagnostics)
                    .await?;
            }

            if plan.content_drift().is_some() {
                current = self.rebuild(ctx, new_spec, diagnostics).await?;
            }

            tracing::info!(
                repository = %new_spec.repository,
                from = %old_spec.image_tag,
                to = %new_spec.image_tag,
                digest = %current.id.digest(),
                "updated image"
            );
            Ok(current)
        })
        .await
    }

    /// Point `change.to` at the manifest of `change.from`, then drop `change.from`.
    async fn retag(
        &self,
        ctx: &ReconcileContext,
        repository: &RepositoryName,
        change: &TagChange,
        recorded: &ImageManifest,
        diagnostics: &mut Diagnostics,
    ) -> Result<ImageManifest, ReconcileError> {
        tracing::info!(%repository, from = %change.from, to = %change.to, "retagging image");

        self.require_repository(ctx, repository).await?;
        if !self.tag_exists(ctx, repository, &change.from).await? {
            if self.holds(ctx, repository, &change.to, recorded).await? {
                diagnostics.warn(Warning::retag_already_applied(format!(
                    "{}:{} already holds the image recorded under {}",
                    repository, change.to, change.from
                )));
                return Ok(recorded.clone());
            }
            return StaleTagReferenceSnafu {
                repository: repository.clone(),
                tag: change.from.clone(),
            }
            .fail();
        }
        self.guard_immutable_tag(ctx, repository, &change.to).await?;

        let manifest = self.manifest_of(ctx, repository, &change.from).await?;

        match self
            .registry
            .put_manifest(ctx.region(), repository, &change.to, &manifest)
            .await
        {
            Ok(()) => {}
            Err(RegistryError::ImageAlreadyExists(_)) => {
                diagnostics.warn(Warning::tag_already_points_at_manifest(format!(
                    "{}:{} already pointed at the manifest of {}",
                    repository, change.to, change.from
                )));
            }
            // Tag appeared after the immutability check.
            Err(RegistryError::TagImmutable(_)) => {
                return ImmutableTagConflictSnafu {
                    repository: repository.clone(),
                    tag: change.to.clone(),
                }
                .fail();
            }
            Err(e) => return Err(e).during_in(repository, "put manifest under new tag"),
        }

        match self
            .registry
            .delete_tag(ctx.region(), repository, &change.from)
            .await
        {
            Ok(()) => {}
            Err(RegistryError::ImageNotFound(_)) => {
                diagnostics.warn(Warning::old_tag_already_removed(format!(
                    "{}:{} was already removed",
                    repository, change.from
                )));
            }
            Err(e) => return Err(e).during_in(repository, "delete old tag"),
        }

        self.manifest_of(ctx, repository, &change.to).await
    }

    /// Build and push under the current tag, replacing an immutable tag if needed.
    async fn rebuild(
        &self,
        ctx: &ReconcileContext,
        spec: &DesiredImageSpec,
        diagnostics: &mut Diagnostics,
    ) -> Result<ResourceState, ReconcileError> {
        tracing::info!(repository = %spec.repository, tag = %spec.image_tag, "build input changed, rebuilding");

        self.require_toolchain().await?;
        self.require_repository(ctx, &spec.repository).await?;

        let replace = self.tag_exists(ctx, &spec.repository, &spec.image_tag).await?
            && self.mutability(ctx, &spec.repository).await?.is_immutable();

        self.publish(ctx, spec, replace, diagnostics).await
    }

    async fn manifest_of(
        &self,
        ctx: &ReconcileContext,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<ImageManifest, ReconcileError> {
        match self.registry.get_manifest(ctx.region(), repository, tag).await {
            Ok(manifest) => Ok(manifest),
            Err(RegistryError::ImageNotFound(_)) => ManifestNotFoundSnafu {
                repository: repository.clone(),
                tag: tag.clone(),
            }
            .fail(),
            Err(e) => Err(e).during_in(repository, "fetch manifest"),
        }
    }

    /// Whether `tag` currently points at `manifest`.
    async fn holds(
        &self,
        ctx: &ReconcileContext,
        repository: &RepositoryName,
        tag: &ImageTag,
        manifest: &ImageManifest,
    ) -> Result<bool, ReconcileError> {
        match self.registry.get_manifest(ctx.region(), repository, tag).await {
            Ok(current) => Ok(current == *manifest),
            Err(RegistryError::ImageNotFound(_)) => Ok(false),
            Err(e) => Err(e).during_in(repository, "fetch manifest"),
        }
    }
}
