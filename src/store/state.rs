// ABOUTME: JSON state file holding the last applied spec and identity per resource.
// ABOUTME: Writes go to a temporary file that is renamed over the old state.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reconcile::{DesiredImageSpec, ResourceState};
use crate::types::Region;

/// Directory holding state and locks, relative to the project root.
pub const STATE_DIR: &str = ".ecrbuildpush";
pub const STATE_FILE: &str = "state.json";

const STATE_VERSION: u32 = 1;

/// Applied spec and resulting identity of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Region the image was pushed to.
    pub region: Region,
    #[serde(flatten)]
    pub spec: DesiredImageSpec,
    #[serde(flatten)]
    pub state: ResourceState,
    pub updated_at: DateTime<Utc>,
}

impl ResourceRecord {
    pub fn new(region: Region, spec: DesiredImageSpec, state: ResourceState) -> Self {
        Self {
            region,
            spec,
            state,
            updated_at: Utc::now(),
        }
    }
}

/// Contents of the state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    pub fn get(&self, name: &str) -> Option<&ResourceRecord> {
        self.resources.get(name)
    }

    /// Record a successful create or update.
    pub fn record(
        &mut self,
        name: &str,
        region: Region,
        spec: DesiredImageSpec,
        state: ResourceState,
    ) {
        self.resources
            .insert(name.to_string(), ResourceRecord::new(region, spec, state));
    }

    /// Forget a resource. Returns the removed record.
    pub fn forget(&mut self, name: &str) -> Option<ResourceRecord> {
        self.resources.remove(name)
    }
}

/// Reads and writes `.ecrbuildpush/state.json`.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Store rooted at `project_dir/.ecrbuildpush`.
    pub fn new(project_dir: &Path) -> Self {
        Self {
            dir: project_dir.join(STATE_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Load the state file. A missing file is empty state.
    pub fn load(&self) -> Result<StateFile> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StateFile::default()),
            Err(e) => return Err(e.into()),
        };

        let state: StateFile = serde_json::from_str(&content)
            .map_err(|source| Error::CorruptState { path: path.clone(), source })?;
        if state.version != STATE_VERSION {
            return Err(Error::InvalidConfig(format!(
                "unsupported state file version {} in {}",
                state.version,
                path.display()
            )));
        }
        Ok(state)
    }

    /// Replace the state file atomically.
    pub fn save(&self, state: &StateFile) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.dir.join(format!("{}.tmp", STATE_FILE));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, self.path())?;
        tracing::debug!(path = %self.path().display(), resources = state.resources.len(), "saved state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::registry::ImageManifest;
    use crate::types::{ImageName, ImageTag, RepositoryName};

    fn region() -> Region {
        Region::new("eu-central-1").unwrap()
    }

    fn record_parts() -> (DesiredImageSpec, ResourceState) {
        (
            DesiredImageSpec {
                repository: RepositoryName::new("repo-1").unwrap(),
                build_context: PathBuf::from("app"),
                image_name: ImageName::new("myapp").unwrap(),
                image_tag: ImageTag::new("v1").unwrap(),
            },
            ResourceState {
                id: ImageManifest::new(r#"{"schemaVersion":2}"#),
                content_fingerprint: Fingerprint::of_bytes(b"FROM scratch\n"),
            },
        )
    }

    #[test]
    fn missing_state_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load().unwrap().resources.is_empty());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let (spec, state) = record_parts();

        let mut file = StateFile::default();
        file.record("web", region(), spec.clone(), state.clone());
        store.save(&file).unwrap();

        let loaded = store.load().unwrap();
        let record = loaded.get("web").unwrap();
        assert_eq!(record.region, region());
        assert_eq!(record.spec, spec);
        assert_eq!(record.state, state);
    }

    #[test]
    fn record_fields_are_flat() {
        let (spec, state) = record_parts();
        let json = serde_json::to_value(ResourceRecord::new(region(), spec, state)).unwrap();
        assert_eq!(json["region"], "eu-central-1");
        assert_eq!(json["repository"], "repo-1");
        assert_eq!(json["image_tag"], "v1");
        assert_eq!(json["id"], r#"{"schemaVersion":2}"#);
        assert!(json["content_fingerprint"].is_string());
        assert!(json["updated_at"].is_string());
    }

    #[test]
    fn corrupt_state_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(Error::CorruptState { .. })));
    }

    #[test]
    fn malformed_fingerprint_is_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let (spec, state) = record_parts();
        let mut file = StateFile::default();
        file.record("web", region(), spec, state);
        store.save(&file).unwrap();

        let saved = std::fs::read_to_string(store.path()).unwrap();
        let fingerprint = Fingerprint::of_bytes(b"FROM scratch\n");
        let edited = saved.replace(fingerprint.as_str(), "ééééééééééééé");
        std::fs::write(store.path(), edited).unwrap();

        assert!(matches!(store.load(), Err(Error::CorruptState { .. })));
    }
}
