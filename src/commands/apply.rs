// ABOUTME: Apply command: create, update or replace each selected resource.
// ABOUTME: Holds the resource lock and records the new state after every success.

use super::Project;
use super::connection::connect;
use ecrbuildpush::diagnostics::{Diagnostics, Warning};
use ecrbuildpush::error::Result;
use ecrbuildpush::output::Output;
use ecrbuildpush::reconcile::{
    self, DesiredImageSpec, ReconcileContext, ReconcileError, ReconcileErrorKind, Reconciler,
    ResourceState,
};
use ecrbuildpush::registry::Registry;
use ecrbuildpush::runtime::ImageBuilder;
use ecrbuildpush::store::{ResourceLock, ResourceRecord};

enum Applied {
    Created(ResourceState),
    Updated(ResourceState),
    Replaced(ResourceState),
    Unchanged,
}

pub async fn apply(
    project: &Project,
    resource: Option<&str>,
    force: bool,
    output: &Output,
) -> Result<()> {
    let selected = project.config.selected(resource)?;
    let reconciler = connect(&project.config, output).await?;
    let mut state = project.store.load()?;

    for resource in selected {
        let spec = project.spec(resource)?;
        let ctx = project.config.context_for(resource)?;
        let lock = ResourceLock::acquire(project.store.dir(), &resource.name, force)?;
        let mut diag = Diagnostics::default();

        output.progress(&format!(
            "  → Applying {} ({}:{} in {})...",
            resource.name,
            spec.repository,
            spec.image_tag,
            ctx.region()
        ));
        let result = apply_one(
            &reconciler,
            &ctx,
            &spec,
            state.get(&resource.name),
            &mut diag,
        )
        .await;

        if let Err(e) = lock.release() {
            diag.warn(Warning::lock_release(format!(
                "failed to release lock for {}: {}",
                resource.name, e
            )));
        }
        for warning in diag.warnings() {
            output.warning(warning);
        }

        let (verb, new_state) = match result? {
            Applied::Unchanged => {
                output.success(&format!("{}: no changes", resource.name));
                continue;
            }
            Applied::Created(s) => ("created", s),
            Applied::Updated(s) => ("updated", s),
            Applied::Replaced(s) => ("replaced", s),
        };

        let digest = new_state.id.digest();
        state.record(&resource.name, ctx.region().clone(), spec, new_state);
        project.store.save(&state)?;
        output.success(&format!("{}: {} {}", resource.name, verb, digest));
    }

    Ok(())
}

async fn apply_one<R: Registry, B: ImageBuilder>(
    reconciler: &Reconciler<R, B>,
    ctx: &ReconcileContext,
    spec: &DesiredImageSpec,
    record: Option<&ResourceRecord>,
    diag: &mut Diagnostics,
) -> std::result::Result<Applied, ReconcileError> {
    let Some(record) = record else {
        return reconciler.create(ctx, spec, diag).await.map(Applied::Created);
    };

    if record.region != *ctx.region() {
        let previous = ctx.in_region(record.region.clone());
        return replace(reconciler, &previous, &record.spec, ctx, spec, diag).await;
    }

    let plan = reconcile::plan(&record.spec, &record.state, spec)?;
    if plan.is_noop() {
        return Ok(Applied::Unchanged);
    }

    if plan.requires_replacement() {
        return replace(reconciler, ctx, &record.spec, ctx, spec, diag).await;
    }

    reconciler
        .update(ctx, &record.spec, &record.state, spec, &plan, diag)
        .await
        .map(Applied::Updated)
}

/// Delete the recorded image, then create the desired one.
async fn replace<R: Registry, B: ImageBuilder>(
    reconciler: &Reconciler<R, B>,
    previous_ctx: &ReconcileContext,
    previous: &DesiredImageSpec,
    ctx: &ReconcileContext,
    spec: &DesiredImageSpec,
    diag: &mut Diagnostics,
) -> std::result::Result<Applied, ReconcileError> {
    match reconciler.delete(previous_ctx, previous).await {
        Ok(()) => {}
        Err(e)
            if matches!(
                e.kind(),
                ReconcileErrorKind::RepositoryNotFound | ReconcileErrorKind::TagNotFound
            ) =>
        {
            tracing::info!("previous image already gone: {}", e);
        }
        Err(e) => return Err(e),
    }
    reconciler.create(ctx, spec, diag).await.map(Applied::Replaced)
}
