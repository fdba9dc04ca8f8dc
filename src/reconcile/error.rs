// ABOUTME: Reconciliation error types with SNAFU pattern.
// ABOUTME: One variant per failure kind; kind() supports programmatic handling.

use std::time::Duration;

use snafu::Snafu;

use crate::fingerprint::FingerprintError;
use crate::registry::RegistryError;
use crate::runtime::BuilderError;
use crate::types::{ImageTag, ParseImageRefError, RepositoryName};

/// A failed lifecycle operation. The caller's resource state is left as it was.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReconcileError {
    #[snafu(display("image toolchain unavailable: {source}"))]
    ToolchainUnavailable { source: BuilderError },

    #[snafu(display("repository {repository} does not exist"))]
    RepositoryNotFound { repository: RepositoryName },

    #[snafu(display("tag {tag} not found in repository {repository}"))]
    TagNotFound {
        repository: RepositoryName,
        tag: ImageTag,
    },

    #[snafu(display(
        "recorded tag {tag} no longer exists in repository {repository}; refresh the resource state"
    ))]
    StaleTagReference {
        repository: RepositoryName,
        tag: ImageTag,
    },

    #[snafu(display(
        "tag {tag} already exists in immutable repository {repository}; choose another tag"
    ))]
    ImmutableTagConflict {
        repository: RepositoryName,
        tag: ImageTag,
    },

    #[snafu(display("cannot read build input: {source}"))]
    BuildInputUnreadable { source: FingerprintError },

    #[snafu(display("failed to build {image}: {source}"))]
    BuildFailed { image: String, source: BuilderError },

    #[snafu(display("failed to tag {image}: {source}"))]
    TagFailed { image: String, source: BuilderError },

    #[snafu(display("failed to push {image}: {source}"))]
    PushFailed { image: String, source: BuilderError },

    #[snafu(display("registry authentication failed: {source}"))]
    AuthenticationFailed { source: RegistryError },

    #[snafu(display("registry host cannot be derived from account id {account_id}: {source}"))]
    InvalidAccountId {
        account_id: String,
        source: ParseImageRefError,
    },

    #[snafu(display("registry unreachable while trying to {action}: {source}"))]
    RegistryUnreachable {
        action: &'static str,
        source: RegistryError,
    },

    #[snafu(display("no manifest found for {repository}:{tag}"))]
    ManifestNotFound {
        repository: RepositoryName,
        tag: ImageTag,
    },

    #[snafu(display("registry rejected request to {action}: {source}"))]
    RegistryRequestFailed {
        action: &'static str,
        source: RegistryError,
    },

    #[snafu(display("{operation} exceeded its deadline of {limit:?}"))]
    DeadlineExceeded {
        operation: &'static str,
        limit: Duration,
        source: tokio::time::error::Elapsed,
    },

    #[snafu(display(
        "repository changed from {from} to {to}; the image must be deleted and created again"
    ))]
    ReplacementRequired {
        from: RepositoryName,
        to: RepositoryName,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileErrorKind {
    ToolchainUnavailable,
    RepositoryNotFound,
    TagNotFound,
    StaleTagReference,
    ImmutableTagConflict,
    BuildInputUnreadable,
    BuildFailed,
    TagFailed,
    PushFailed,
    AuthenticationFailed,
    RegistryUnreachable,
    ManifestNotFound,
    RegistryRequestFailed,
    DeadlineExceeded,
    ReplacementRequired,
}

impl ReconcileError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ReconcileErrorKind {
        match self {
            ReconcileError::ToolchainUnavailable { .. } => ReconcileErrorKind::ToolchainUnavailable,
            ReconcileError::RepositoryNotFound { .. } => ReconcileErrorKind::RepositoryNotFound,
            ReconcileError::TagNotFound { .. } => ReconcileErrorKind::TagNotFound,
            ReconcileError::StaleTagReference { .. } => ReconcileErrorKind::StaleTagReference,
            ReconcileError::ImmutableTagConflict { .. } => ReconcileErrorKind::ImmutableTagConflict,
            ReconcileError::BuildInputUnreadable { .. } => ReconcileErrorKind::BuildInputUnreadable,
            ReconcileError::BuildFailed { .. } => ReconcileErrorKind::BuildFailed,
            ReconcileError::TagFailed { .. } => ReconcileErrorKind::TagFailed,
            ReconcileError::PushFailed { .. } => ReconcileErrorKind::PushFailed,
            ReconcileError::AuthenticationFailed { .. } => ReconcileErrorKind::AuthenticationFailed,
            ReconcileError::InvalidAccountId { .. } => ReconcileErrorKind::RegistryRequestFailed,
            ReconcileError::RegistryUnreachable { .. } => ReconcileErrorKind::RegistryUnreachable,
            ReconcileError::ManifestNotFound { .. } => ReconcileErrorKind::ManifestNotFound,
            ReconcileError::RegistryRequestFailed { .. } => {
                ReconcileErrorKind::RegistryRequestFailed
            }
            ReconcileError::DeadlineExceeded { .. } => ReconcileErrorKind::DeadlineExceeded,
            ReconcileError::ReplacementRequired { .. } => ReconcileErrorKind::ReplacementRequired,
        }
    }

    /// Layers uploaded before a push failed.
    pub fn layers_pushed(&self) -> Option<usize> {
        match self {
            ReconcileError::PushFailed { source, .. } => source.layers_pushed(),
            _ => None,
        }
    }
}

/// Classify registry failures by what the reconciler was doing.
pub(crate) trait RegistryResultExt<T> {
    fn during(self, action: &'static str) -> Result<T, ReconcileError>;

    /// As `during`, but a missing repository is reported as `RepositoryNotFound`.
    fn during_in(
        self,
        repository: &RepositoryName,
        action: &'static str,
    ) -> Result<T, ReconcileError>;
}

impl<T> RegistryResultExt<T> for Result<T, RegistryError> {
    fn during(self, action: &'static str) -> Result<T, ReconcileError> {
        self.map_err(|source| match source {
            RegistryError::Unreachable(_) => ReconcileError::RegistryUnreachable { action, source },
            RegistryError::Unauthorized(_) => ReconcileError::AuthenticationFailed { source },
            _ => ReconcileError::RegistryRequestFailed { action, source },
        })
    }

    fn during_in(
        self,
        repository: &RepositoryName,
        action: &'static str,
    ) -> Result<T, ReconcileError> {
        match self {
            Err(RegistryError::RepositoryNotFound(_)) => RepositoryNotFoundSnafu {
                repository: repository.clone(),
            }
            .fail(),
            other => other.during(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn during_classifies_registry_errors() {
        let unreachable: Result<(), _> =
            Err(RegistryError::Unreachable("connection refused".into()));
        assert_eq!(
            unreachable.during("check tag").unwrap_err().kind(),
            ReconcileErrorKind::RegistryUnreachable
        );

        let denied: Result<(), _> = Err(RegistryError::Unauthorized("expired".into()));
        assert_eq!(
            denied.during("check tag").unwrap_err().kind(),
            ReconcileErrorKind::AuthenticationFailed
        );

        let other: Result<(), _> = Err(RegistryError::Api("throttled".into()));
        assert_eq!(
            other.during("check tag").unwrap_err().kind(),
            ReconcileErrorKind::RegistryRequestFailed
        );
    }

    #[test]
    fn during_in_reports_vanished_repository() {
        let repository = RepositoryName::new("repo-1").unwrap();

        let gone: Result<(), _> = Err(RegistryError::RepositoryNotFound("repo-1".into()));
        assert_eq!(
            gone.during_in(&repository, "check tag").unwrap_err().kind(),
            ReconcileErrorKind::RepositoryNotFound
        );

        let gone: Result<(), _> = Err(RegistryError::RepositoryNotFound("repo-1".into()));
        assert_eq!(
            gone.during("check tag").unwrap_err().kind(),
            ReconcileErrorKind::RegistryRequestFailed
        );

        let throttled: Result<(), _> = Err(RegistryError::Api("throttled".into()));
        assert_eq!(
            throttled.during_in(&repository, "check tag").unwrap_err().kind(),
            ReconcileErrorKind::RegistryRequestFailed
        );
    }

    #[test]
    fn layers_pushed_only_for_push_failures() {
        let err = ReconcileError::PushFailed {
            image: "repo:v1".into(),
            source: BuilderError::PushFailed {
                reference: "repo:v1".into(),
                message: "broken pipe".into(),
                layers_pushed: 3,
            },
        };
        assert_eq!(err.layers_pushed(), Some(3));

        let err = ReconcileError::BuildFailed {
            image: "repo:v1".into(),
            source: BuilderError::BuildFailed("syntax".into()),
        };
        assert_eq!(err.layers_pushed(), None);
    }
}
