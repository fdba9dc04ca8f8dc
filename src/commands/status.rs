// ABOUTME: Status command: print recorded state for each configured resource.
// ABOUTME: Reads only the local state file.

use super::Project;
use chrono::{DateTime, Utc};
use ecrbuildpush::error::Result;
use ecrbuildpush::output::Output;
use serde::Serialize;

#[derive(Serialize)]
struct StatusLine<'a> {
    resource: &'a str,
    created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_fingerprint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

pub fn status(project: &Project, output: &Output) -> Result<()> {
    let state = project.store.load()?;

    for resource in project.config.resources.iter() {
        match state.get(&resource.name) {
            None => output.report(
                &format!("{}: not created", resource.name),
                &StatusLine {
                    resource: &resource.name,
                    created: false,
                    region: None,
                    image: None,
                    digest: None,
                    content_fingerprint: None,
                    updated_at: None,
                },
            ),
            Some(record) => {
                let image = format!("{}:{}", record.spec.repository, record.spec.image_tag);
                let digest = record.state.id.digest();
                let line = format!(
                    "{}: {} ({}, {}, Dockerfile {}, updated {})",
                    resource.name,
                    image,
                    digest,
                    record.region,
                    record.state.content_fingerprint.short(),
                    record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
                output.report(
                    &line,
                    &StatusLine {
                        resource: &resource.name,
                        created: true,
                        region: Some(record.region.as_str()),
                        image: Some(image),
                        digest: Some(digest),
                        content_fingerprint: Some(record.state.content_fingerprint.as_str()),
                        updated_at: Some(record.updated_at),
                    },
                );
            }
        }
    }

    Ok(())
}
