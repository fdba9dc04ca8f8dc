// ABOUTME: Destroy command: delete each selected resource's tag and forget it.
// ABOUTME: Resources without recorded state are skipped.

use super::Project;
use super::connection::connect;
use ecrbuildpush::diagnostics::{Diagnostics, Warning};
use ecrbuildpush::error::Result;
use ecrbuildpush::output::Output;
use ecrbuildpush::store::ResourceLock;

pub async fn destroy(
    project: &Project,
    resource: Option<&str>,
    force: bool,
    output: &Output,
) -> Result<()> {
    let selected = project.config.selected(resource)?;
    let mut state = project.store.load()?;

    if selected.iter().all(|r| state.get(&r.name).is_none()) {
        output.success("Nothing to destroy");
        return Ok(());
    }

    let base = project.config.context()?;
    let reconciler = connect(&project.config, output).await?;

    for resource in selected {
        let Some(record) = state.get(&resource.name).cloned() else {
            output.progress(&format!("  → {} was never created, skipping", resource.name));
            continue;
        };

        let ctx = base.in_region(record.region.clone());
        let lock = ResourceLock::acquire(project.store.dir(), &resource.name, force)?;
        let result = reconciler.delete(&ctx, &record.spec).await;

        let mut diag = Diagnostics::default();
        if let Err(e) = lock.release() {
            diag.warn(Warning::lock_release(format!(
                "failed to release lock for {}: {}",
                resource.name, e
            )));
        }
        for warning in diag.warnings() {
            output.warning(warning);
        }
        result?;

        state.forget(&resource.name);
        project.store.save(&state)?;
        output.success(&format!(
            "{}: deleted {}:{}",
            resource.name, record.spec.repository, record.spec.image_tag
        ));
    }

    Ok(())
}
