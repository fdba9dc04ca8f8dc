// ABOUTME: Plan-time drift detection between recorded and desired state.
// ABOUTME: Recomputes the fingerprint and reports tag change, content drift and replacement.

use std::fmt;

use serde::Serialize;
use snafu::ResultExt;

use super::error::{BuildInputUnreadableSnafu, ReconcileError};
use super::spec::{DesiredImageSpec, ResourceState};
use crate::fingerprint::{self, Fingerprint};
use crate::types::{ImageTag, Region, RepositoryName};

/// Field replaced in place when the build input changes.
pub const CONTENT_FINGERPRINT_FIELD: &str = "content_fingerprint";

/// A tag rename applied by retagging the existing manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChange {
    pub from: ImageTag,
    pub to: ImageTag,
}

/// A repository change; the image cannot move, so it is recreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryChange {
    pub from: RepositoryName,
    pub to: RepositoryName,
}

/// Differences between what was pushed and what is desired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    tag_change: Option<TagChange>,
    content_drift: Option<Fingerprint>,
    repository_change: Option<RepositoryChange>,
}

impl UpdatePlan {
    /// Tag rename, if the desired tag differs from the recorded one.
    pub fn tag_change(&self) -> Option<&TagChange> {
        self.tag_change.as_ref()
    }

    /// Fingerprint of the current build input, if it differs from the recorded one.
    pub fn content_drift(&self) -> Option<&Fingerprint> {
        self.content_drift.as_ref()
    }

    pub fn repository_change(&self) -> Option<&RepositoryChange> {
        self.repository_change.as_ref()
    }

    /// Nothing to do.
    pub fn is_noop(&self) -> bool {
        self.tag_change.is_none() && self.content_drift.is_none() && self.repository_change.is_none()
    }

    pub fn requires_replacement(&self) -> bool {
        self.repository_change.is_some()
    }

    /// Fields that keep their identity slot but receive new content.
    pub fn replaced_in_place(&self) -> &'static [&'static str] {
        if self.content_drift.is_some() && !self.requires_replacement() {
            &[CONTENT_FINGERPRINT_FIELD]
        } else {
            &[]
        }
    }

    /// Summary of what an update would do.
    pub fn action(&self, state: &ResourceState) -> PlannedAction {
        if let Some(change) = &self.repository_change {
            return PlannedAction::Replace {
                from: change.from.clone(),
                to: change.to.clone(),
            };
        }
        let rebuild = self.content_drift.as_ref().map(|to| ContentChange {
            from: state.content_fingerprint.short().to_string(),
            to: to.short().to_string(),
        });
        match (self.tag_change.clone(), rebuild) {
            (None, None) => PlannedAction::NoChanges,
            (Some(retag), None) => PlannedAction::Retag(retag),
            (None, Some(rebuild)) => PlannedAction::Rebuild(rebuild),
            (Some(retag), Some(rebuild)) => PlannedAction::RetagAndRebuild { retag, rebuild },
        }
    }
}

/// Fingerprint change shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentChange {
    pub from: String,
    pub to: String,
}

/// What `apply` will do for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    Create,
    NoChanges,
    Retag(TagChange),
    Rebuild(ContentChange),
    RetagAndRebuild {
        retag: TagChange,
        rebuild: ContentChange,
    },
    Replace {
        from: RepositoryName,
        to: RepositoryName,
    },
    /// The image moves to another region: delete there, create here.
    Relocate {
        from: Region,
        to: Region,
    },
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Create => write!(f, "create"),
            PlannedAction::NoChanges => write!(f, "no changes"),
            PlannedAction::Retag(retag) => write!(f, "retag {} -> {}", retag.from, retag.to),
            PlannedAction::Rebuild(rebuild) => {
                write!(f, "rebuild (Dockerfile {} -> {})", rebuild.from, rebuild.to)
            }
            PlannedAction::RetagAndRebuild { retag, rebuild } => write!(
                f,
                "retag {} -> {}, then rebuild (Dockerfile {} -> {})",
                retag.from, retag.to, rebuild.from, rebuild.to
            ),
            PlannedAction::Replace { from, to } => {
                write!(f, "replace (repository {} -> {})", from, to)
            }
            PlannedAction::Relocate { from, to } => {
                write!(f, "replace (region {} -> {})", from, to)
            }
        }
    }
}

/// Compare recorded and desired state.
///
/// Reads the build instructions of `new_spec` to detect content drift.
pub fn plan(
    old_spec: &DesiredImageSpec,
    state: &ResourceState,
    new_spec: &DesiredImageSpec,
) -> Result<UpdatePlan, ReconcileError> {
    let current = fingerprint::compute(&new_spec.build_context).context(BuildInputUnreadableSnafu)?;

    let content_drift = (current != state.content_fingerprint).then_some(current);
    let tag_change = (old_spec.image_tag != new_spec.image_tag).then(|| TagChange {
        from: old_spec.image_tag.clone(),
        to: new_spec.image_tag.clone(),
    });
    let repository_change = (old_spec.repository != new_spec.repository).then(|| RepositoryChange {
        from: old_spec.repository.clone(),
        to: new_spec.repository.clone(),
    });

    let plan = UpdatePlan {
        tag_change,
        content_drift,
        repository_change,
    };
    tracing::debug!(resource = %new_spec.repository, ?plan, "planned update");
    Ok(plan)
}
