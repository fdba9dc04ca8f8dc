// ABOUTME: Project directory: configuration plus the local state store.
// ABOUTME: Shared by every command that works on configured resources.

use ecrbuildpush::config::{Config, ResourceConfig};
use ecrbuildpush::error::Result;
use ecrbuildpush::reconcile::DesiredImageSpec;
use ecrbuildpush::store::StateStore;
use std::path::{Path, PathBuf};

pub struct Project {
    pub dir: PathBuf,
    pub config: Config,
    pub store: StateStore,
}

impl Project {
    pub fn discover(dir: &Path) -> Result<Self> {
        Ok(Self {
            dir: dir.to_path_buf(),
            config: Config::discover(dir)?,
            store: StateStore::new(dir),
        })
    }

    /// Desired spec of a configured resource.
    pub fn spec(&self, resource: &ResourceConfig) -> Result<DesiredImageSpec> {
        resource.desired_spec(&self.dir)
    }
}
