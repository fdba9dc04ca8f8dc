// ABOUTME: Per-call context for lifecycle operations.
// ABOUTME: Every registry call is sent to the context's region; the deadline bounds the whole operation.

use std::time::Duration;

use crate::types::Region;

/// Region and deadline for one lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileContext {
    region: Region,
    deadline: Option<Duration>,
}

impl ReconcileContext {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            deadline: None,
        }
    }

    /// Bound every operation run with this context by `limit`.
    pub fn with_deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// The same deadline, applied in another region.
    pub fn in_region(&self, region: Region) -> Self {
        Self {
            region,
            deadline: self.deadline,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}
