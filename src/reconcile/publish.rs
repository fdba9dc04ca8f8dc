// ABOUTME: Build, tag, authenticate, push and resolve as a typed pipeline.
// ABOUTME: Each step consumes the previous state, so steps cannot run out of order.

use snafu::ResultExt;

use super::error::{
    BuildFailedSnafu, ManifestNotFoundSnafu, PushFailedSnafu, ReconcileError, RegistryResultExt,
    TagFailedSnafu,
};
use super::spec::{DesiredImageSpec, ResourceState};
use super::state::{Authenticated, Built, Pending, Pushed, Tagged};
use crate::diagnostics::{Diagnostics, Warning};
use crate::fingerprint::Fingerprint;
use crate::registry::{RegistryAuthenticator, RegistryError, RegistryInspector, RegistryMutator};
use crate::runtime::ImageBuilder;
use crate::types::{Region, RegistryHost};

/// One image on its way from the build context to the registry.
pub(crate) struct Publish<'a, B, S> {
    builder: &'a B,
    spec: &'a DesiredImageSpec,
    region: &'a Region,
    fingerprint: Fingerprint,
    state: S,
}

impl<'a, B, S> Publish<'a, B, S> {
    fn advance<T>(self, state: T) -> Publish<'a, B, T> {
        Publish {
            builder: self.builder,
            spec: self.spec,
            region: self.region,
            fingerprint: self.fingerprint,
            state,
        }
    }
}

// =============================================================================
// Pending -> Built
// =============================================================================

impl<'a, B: ImageBuilder> Publish<'a, B, Pending> {
    pub(crate) fn new(
        builder: &'a B,
        spec: &'a DesiredImageSpec,
        region: &'a Region,
        fingerprint: Fingerprint,
    ) -> Self {
        Publish {
            builder,
            spec,
            region,
            fingerprint,
            state: Pending,
        }
    }

    /// Build the local image from the build context.
    pub(crate) async fn build(self) -> Result<Publish<'a, B, Built>, ReconcileError> {
        let local = self.spec.local_ref();
        tracing::info!(image = %local, context = %self.spec.build_context.display(), "building image");

        self.builder
            .build_image(&local, &self.spec.build_context)
            .await
            .context(BuildFailedSnafu {
                image: local.to_string(),
            })?;

        Ok(self.advance(Built))
    }
}

// =============================================================================
// Built -> Tagged
// =============================================================================

impl<'a, B: ImageBuilder> Publish<'a, B, Built> {
    /// Tag the local image with its registry reference.
    pub(crate) async fn tag(self, host: &RegistryHost) -> Result<Publish<'a, B, Tagged>, ReconcileError> {
        let local = self.spec.local_ref();
        let remote = self.spec.remote_ref(host);
        tracing::debug!(source = %local, target = %remote, "tagging image");

        self.builder
            .tag_image(&local, &remote)
            .await
            .context(TagFailedSnafu {
                image: local.to_string(),
            })?;

        Ok(self.advance(Tagged { remote }))
    }
}

// =============================================================================
// Tagged -> Authenticated
// =============================================================================

impl<'a, B: ImageBuilder> Publish<'a, B, Tagged> {
    /// Obtain push credentials before any layer is sent.
    pub(crate) async fn authenticate<A: RegistryAuthenticator>(
        self,
        registry: &A,
    ) -> Result<Publish<'a, B, Authenticated>, ReconcileError> {
        let auth = match registry.authorization(self.region).await {
            Ok(auth) => auth,
            Err(source @ RegistryError::Unreachable(_)) => {
                return Err(ReconcileError::RegistryUnreachable {
                    action: "obtain push credentials",
                    source,
                });
            }
            Err(source) => return Err(ReconcileError::AuthenticationFailed { source }),
        };

        let remote = self.state.remote.clone();
        Ok(self.advance(Authenticated { remote, auth }))
    }
}

// =============================================================================
// Authenticated -> Pushed
// =============================================================================

impl<'a, B: ImageBuilder> Publish<'a, B, Authenticated> {
    /// Delete the remote tag of an immutable repository so the push can reuse it.
    pub(crate) async fn release_immutable_tag<M: RegistryMutator>(
        &self,
        registry: &M,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ReconcileError> {
        let repository = &self.spec.repository;
        let tag = &self.spec.image_tag;

        match registry.delete_tag(self.region, repository, tag).await {
            Ok(()) => {
                diagnostics.warn(Warning::immutable_tag_replaced(format!(
                    "deleted {}:{} from immutable repository to push the rebuilt image",
                    repository, tag
                )));
                Ok(())
            }
            Err(RegistryError::ImageNotFound(_)) => Ok(()),
            Err(e) => Err(e).during_in(repository, "delete immutable tag before push"),
        }
    }

    /// Push the tagged image.
    pub(crate) async fn push(self) -> Result<Publish<'a, B, Pushed>, ReconcileError> {
        let remote = self.state.remote.clone();
        tracing::info!(image = %remote, "pushing image");

        let report = self
            .builder
            .push_image(&remote, &self.state.auth)
            .await
            .context(PushFailedSnafu {
                image: remote.to_string(),
            })?;

        tracing::info!(
            image = %remote,
            pushed = report.layers_pushed,
            reused = report.layers_reused,
            "pushed image"
        );
        Ok(self.advance(Pushed { remote, report }))
    }
}

// =============================================================================
// Pushed -> ResourceState
// =============================================================================

impl<'a, B> Publish<'a, B, Pushed> {
    /// Fetch the manifest the registry now holds under the tag.
    pub(crate) async fn resolve<I: RegistryInspector>(
        self,
        registry: &I,
    ) -> Result<ResourceState, ReconcileError> {
        let repository = &self.spec.repository;
        let tag = &self.spec.image_tag;

        let id = match registry.get_manifest(self.region, repository, tag).await {
            Ok(manifest) => manifest,
            Err(RegistryError::ImageNotFound(_)) => {
                return ManifestNotFoundSnafu {
                    repository: repository.clone(),
                    tag: tag.clone(),
                }
                .fail();
            }
            Err(e) => return Err(e).during_in(repository, "fetch pushed manifest"),
        };

        tracing::debug!(
            image = %self.state.remote,
            digest = %id.digest(),
            layers_pushed = self.state.report.layers_pushed,
            "resolved manifest"
        );
        Ok(ResourceState {
            id,
            content_fingerprint: self.fingerprint,
        })
    }
}
