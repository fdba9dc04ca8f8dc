// ABOUTME: The lifecycle reconciler and the checks its operations share.
// ABOUTME: Generic over the registry and the image builder so tests can use fakes.

use std::future::Future;

use snafu::ResultExt;

use super::context::ReconcileContext;
use super::error::{
    BuildInputUnreadableSnafu, DeadlineExceededSnafu, ImmutableTagConflictSnafu,
    InvalidAccountIdSnafu, ReconcileError, RegistryResultExt, RepositoryNotFoundSnafu,
    ToolchainUnavailableSnafu,
};
use super::publish::Publish;
use super::spec::{DesiredImageSpec, ResourceState};
use crate::diagnostics::{Diagnostics, Warning};
use crate::fingerprint;
use crate::registry::{Registry, TagMutability};
use crate::runtime::ImageBuilder;
use crate::types::{ImageTag, RegistryHost, RepositoryName};

/// Converges image resources between desired state and the registry.
///
/// Holds no state between calls; every query goes to the registry.
pub struct Reconciler<R, B> {
    pub(crate) registry: R,
    pub(crate) builder: B,
}

impl<R: Registry, B: ImageBuilder> Reconciler<R, B> {
    pub fn new(registry: R, builder: B) -> Self {
        Self { registry, builder }
    }

    /// Run `operation` under the context's deadline, if any.
    pub(crate) async fn within_deadline<T, F>(
        ctx: &ReconcileContext,
        operation: &'static str,
        fut: F,
    ) -> Result<T, ReconcileError>
    where
        F: Future<Output = Result<T, ReconcileError>>,
    {
        match ctx.deadline() {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .context(DeadlineExceededSnafu { operation, limit })?,
            None => fut.await,
        }
    }

    pub(crate) async fn require_toolchain(&self) -> Result<(), ReconcileError> {
        self.builder
            .toolchain_running()
            .await
            .context(ToolchainUnavailableSnafu)
    }

    pub(crate) async fn require_repository(
        &self,
        ctx: &ReconcileContext,
        repository: &RepositoryName,
    ) -> Result<(), ReconcileError> {
        let exists = self
            .registry
            .repository_exists(ctx.region(), repository)
            .await
            .during("check repository")?;
        if !exists {
            return RepositoryNotFoundSnafu {
                repository: repository.clone(),
            }
            .fail();
        }
        Ok(())
    }

    pub(crate) async fn tag_exists(
        &self,
        ctx: &ReconcileContext,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<bool, ReconcileError> {
        self.registry
            .tag_exists(ctx.region(), repository, tag)
            .await
            .during_in(repository, "check tag")
    }

    pub(crate) async fn mutability(
        &self,
        ctx: &ReconcileContext,
        repository: &RepositoryName,
    ) -> Result<TagMutability, ReconcileError> {
        self.registry
            .repository_mutability(ctx.region(), repository)
            .await
            .during_in(repository, "read tag mutability")
    }

    /// Fail when `tag` exists in an immutable repository.
    ///
    /// Returns whether the tag exists.
    pub(crate) async fn guard_immutable_tag(
        &self,
        ctx: &ReconcileContext,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<bool, ReconcileError> {
        if !self.tag_exists(ctx, repository, tag).await? {
            return Ok(false);
        }
        if self.mutability(ctx, repository).await?.is_immutable() {
            return ImmutableTagConflictSnafu {
                repository: repository.clone(),
                tag: tag.clone(),
            }
            .fail();
        }
        tracing::debug!(%repository, %tag, "tag exists in mutable repository and will be overwritten");
        Ok(true)
    }

    pub(crate) async fn registry_host(
        &self,
        ctx: &ReconcileContext,
    ) -> Result<RegistryHost, ReconcileError> {
        let account_id = self
            .registry
            .account_id(ctx.region())
            .await
            .during("resolve account id")?;
        RegistryHost::new(&account_id, ctx.region()).context(InvalidAccountIdSnafu {
            account_id: account_id.clone(),
        })
    }

    /// Fingerprint, build, tag, authenticate, push and resolve `spec`.
    ///
    /// With `replace_immutable_tag`, the remote tag is deleted after
    /// authentication and immediately before the push.
    pub(crate) async fn publish(
        &self,
        ctx: &ReconcileContext,
        spec: &DesiredImageSpec,
        replace_immutable_tag: bool,
        diagnostics: &mut Diagnostics,
    ) -> Result<ResourceState, ReconcileError> {
        let uncovered = fingerprint::uncovered_entries(&spec.build_context);
        if uncovered > 0 {
            diagnostics.warn(Warning::uncovered_build_inputs(format!(
                "{} other entr{} in {} will not trigger a rebuild when changed; only the Dockerfile is fingerprinted",
                uncovered,
                if uncovered == 1 { "y" } else { "ies" },
                spec.build_context.display()
            )));
        }

        let fingerprint =
            fingerprint::compute(&spec.build_context).context(BuildInputUnreadableSnafu)?;

        let built = Publish::new(&self.builder, spec, ctx.region(), fingerprint)
            .build()
            .await?;
        let host = self.registry_host(ctx).await?;
        let tagged = built.tag(&host).await?;
        let authenticated = tagged.authenticate(&self.registry).await?;
        if replace_immutable_tag {
            authenticated
                .release_immutable_tag(&self.registry, diagnostics)
                .await?;
        }
        let pushed = authenticated.push().await?;
        pushed.resolve(&self.registry).await
    }
}
