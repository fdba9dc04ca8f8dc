// ABOUTME: Configuration types and parsing for ecrbuildpush.yml.
// ABOUTME: Handles YAML parsing, env var interpolation and resource lookup.

mod deserialize;
mod env_value;
mod init;

pub use deserialize::validate_resource_name;
pub use env_value::EnvValue;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::reconcile::{DesiredImageSpec, ReconcileContext};
use crate::runtime::RuntimeConfig;
use crate::types::{ImageName, ImageTag, Region, RepositoryName};
use deserialize::{deserialize_resource_name, deserialize_resources};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "ecrbuildpush.yml";
pub const CONFIG_FILENAME_ALT: &str = "ecrbuildpush.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".ecrbuildpush/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// AWS region of the registry, unless a resource overrides it.
    pub region: EnvValue,

    /// Deadline for each lifecycle operation.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    #[serde(flatten)]
    pub runtime: RuntimeConfig,

    #[serde(deserialize_with = "deserialize_resources")]
    pub resources: NonEmpty<ResourceConfig>,
}

/// One image resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(deserialize_with = "deserialize_resource_name")]
    pub name: String,

    pub repository: RepositoryName,

    /// Region override for this resource.
    #[serde(default)]
    pub region: Option<EnvValue>,

    /// Build context directory, relative to the config directory.
    #[serde(default = "default_dockerfile_path")]
    pub dockerfile_path: PathBuf,

    pub image_name: ImageName,

    pub image_tag: EnvValue,
}

fn default_dockerfile_path() -> PathBuf {
    PathBuf::from(".")
}

impl ResourceConfig {
    /// Resolve env references into a desired image spec.
    ///
    /// Relative build contexts are resolved against `base_dir`.
    pub fn desired_spec(&self, base_dir: &Path) -> Result<DesiredImageSpec> {
        let tag = self.image_tag.resolve()?;
        let image_tag = ImageTag::new(&tag)
            .map_err(|e| Error::InvalidConfig(format!("resource {}: {}", self.name, e)))?;

        Ok(DesiredImageSpec {
            repository: self.repository.clone(),
            build_context: base_dir.join(&self.dockerfile_path),
            image_name: self.image_name.clone(),
            image_tag,
        })
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Resolve the configured region.
    pub fn region(&self) -> Result<Region> {
        let region = self.region.resolve()?;
        Region::new(&region).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Resolve the region `resource` lives in.
    pub fn region_for(&self, resource: &ResourceConfig) -> Result<Region> {
        let Some(value) = &resource.region else {
            return self.region();
        };
        let region = value.resolve()?;
        Region::new(&region)
            .map_err(|e| Error::InvalidConfig(format!("resource {}: {}", resource.name, e)))
    }

    /// Context for operations in the project region.
    pub fn context(&self) -> Result<ReconcileContext> {
        Ok(self.context_in(self.region()?))
    }

    /// Context for operations on `resource`.
    pub fn context_for(&self, resource: &ResourceConfig) -> Result<ReconcileContext> {
        Ok(self.context_in(self.region_for(resource)?))
    }

    fn context_in(&self, region: Region) -> ReconcileContext {
        let ctx = ReconcileContext::new(region);
        match self.timeout {
            Some(limit) => ctx.with_deadline(limit),
            None => ctx,
        }
    }

    pub fn resource(&self, name: &str) -> Result<&ResourceConfig> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::UnknownResource(name.to_string()))
    }

    /// Resources selected by an optional name filter.
    pub fn selected(&self, name: Option<&str>) -> Result<Vec<&ResourceConfig>> {
        match name {
            Some(name) => Ok(vec![self.resource(name)?]),
            None => Ok(self.resources.iter().collect()),
        }
    }

    pub fn template() -> Result<Self> {
        Ok(Config {
            region: EnvValue::FromEnv {
                var: "AWS_REGION".to_string(),
                default: Some("eu-central-1".to_string()),
            },
            timeout: Some(Duration::from_secs(15 * 60)),
            runtime: RuntimeConfig::default(),
            resources: NonEmpty::new(ResourceConfig {
                name: "web".to_string(),
                repository: RepositoryName::new("my-app").map_err(|e| Error::InvalidConfig(e.to_string()))?,
                region: None,
                dockerfile_path: default_dockerfile_path(),
                image_name: ImageName::new("my-app").map_err(|e| Error::InvalidConfig(e.to_string()))?,
                image_tag: EnvValue::literal("latest"),
            }),
        })
    }
}
