// ABOUTME: Image lifecycle reconciliation: create, read, update, delete and drift planning.
// ABOUTME: Decides when to build, tag, push, retag or delete while respecting tag immutability.

mod context;
mod create;
mod delete;
mod error;
mod plan;
mod publish;
mod read;
mod reconciler;
mod spec;
mod state;
mod update;

pub use context::ReconcileContext;
pub use error::{ReconcileError, ReconcileErrorKind};
pub use plan::{
    CONTENT_FINGERPRINT_FIELD, ContentChange, PlannedAction, RepositoryChange, TagChange,
    UpdatePlan, plan,
};
pub use reconciler::Reconciler;
pub use spec::{DesiredImageSpec, ReadOutcome, ResourceState};
