// ABOUTME: Plan command: report what apply would do for each resource.
// ABOUTME: Compares recorded state with the configuration without contacting the registry.

use super::Project;
use ecrbuildpush::error::Result;
use ecrbuildpush::output::Output;
use ecrbuildpush::reconcile::{self, PlannedAction};
use serde::Serialize;

#[derive(Serialize)]
struct PlanLine<'a> {
    resource: &'a str,
    #[serde(flatten)]
    action: &'a PlannedAction,
    replaced_in_place: &'a [&'a str],
}

pub fn plan(project: &Project, output: &Output) -> Result<()> {
    let state = project.store.load()?;

    for resource in project.config.resources.iter() {
        let spec = project.spec(resource)?;
        let region = project.config.region_for(resource)?;

        let (action, replaced_in_place) = match state.get(&resource.name) {
            None => (PlannedAction::Create, &[][..]),
            Some(record) if record.region != region => (
                PlannedAction::Relocate {
                    from: record.region.clone(),
                    to: region,
                },
                &[][..],
            ),
            Some(record) => {
                let plan = reconcile::plan(&record.spec, &record.state, &spec)?;
                (plan.action(&record.state), plan.replaced_in_place())
            }
        };

        output.report(
            &format!("{}: {}", resource.name, action),
            &PlanLine {
                resource: &resource.name,
                action: &action,
                replaced_in_place,
            },
        );
    }

    Ok(())
}
