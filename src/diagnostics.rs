// ABOUTME: Diagnostics accumulator for non-fatal warnings during reconciliation.
// ABOUTME: Collects warnings that shouldn't fail an operation but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during lifecycle operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check whether a warning of `kind` was recorded.
    pub fn contains(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// A non-fatal warning collected during reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The old tag was already gone when a retag tried to remove it.
    pub fn old_tag_already_removed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::OldTagAlreadyRemoved,
            message: message.into(),
        }
    }

    /// The new tag already referenced the manifest being retagged.
    pub fn tag_already_points_at_manifest(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::TagAlreadyPointsAtManifest,
            message: message.into(),
        }
    }

    /// A retag found its work already done by an earlier, interrupted update.
    pub fn retag_already_applied(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RetagAlreadyApplied,
            message: message.into(),
        }
    }

    /// Files in the build context are not covered by the fingerprint.
    pub fn uncovered_build_inputs(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UncoveredBuildInputs,
            message: message.into(),
        }
    }

    /// An immutable tag was removed so a rebuilt image could take its place.
    pub fn immutable_tag_replaced(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ImmutableTagReplaced,
            message: message.into(),
        }
    }

    /// Failed to release a resource lock (lock file may remain).
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LockRelease,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Old tag was missing when a retag removed it.
    OldTagAlreadyRemoved,
    /// Retag target was already in place.
    TagAlreadyPointsAtManifest,
    /// Old tag gone and new tag holding the recorded image.
    RetagAlreadyApplied,
    /// Only the Dockerfile is fingerprinted; other context files changed silently.
    UncoveredBuildInputs,
    /// Immutable tag deleted before pushing the rebuilt image.
    ImmutableTagReplaced,
    /// Failed to release a resource lock.
    LockRelease,
}
