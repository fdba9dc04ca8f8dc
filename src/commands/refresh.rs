// ABOUTME: Refresh command: read every recorded resource back from the registry.
// ABOUTME: Resources whose repository or tag is gone are dropped from state.

use super::Project;
use super::connection::connect;
use ecrbuildpush::error::Result;
use ecrbuildpush::output::Output;
use ecrbuildpush::reconcile::ReadOutcome;
use ecrbuildpush::store::ResourceLock;

pub async fn refresh(project: &Project, output: &Output) -> Result<()> {
    let mut state = project.store.load()?;
    if state.resources.is_empty() {
        output.success("Nothing to refresh");
        return Ok(());
    }

    let base = project.config.context()?;
    let reconciler = connect(&project.config, output).await?;

    let names: Vec<String> = state.resources.keys().cloned().collect();
    for name in names {
        let Some(record) = state.get(&name).cloned() else {
            continue;
        };

        let ctx = base.in_region(record.region.clone());
        let lock = ResourceLock::acquire(project.store.dir(), &name, false)?;
        let outcome = reconciler.read(&ctx, &record.spec, &record.state).await;
        if let Err(e) = lock.release() {
            tracing::warn!("failed to release lock for {}: {}", name, e);
        }

        match outcome? {
            ReadOutcome::Present(current) => {
                let changed = current.id != record.state.id;
                state.record(&name, record.region, record.spec, current);
                output.success(&format!(
                    "{}: {}",
                    name,
                    if changed { "manifest changed" } else { "up to date" }
                ));
            }
            ReadOutcome::Absent => {
                state.forget(&name);
                output.success(&format!("{}: gone from registry, removed from state", name));
            }
        }
    }

    project.store.save(&state)?;
    Ok(())
}
