// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates ecrbuildpush.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ImageName, ImageTag, RepositoryName};

use super::{CONFIG_FILENAME, Config, EnvValue};

pub fn init_config(
    dir: &Path,
    repository: Option<&str>,
    image: Option<&str>,
    tag: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template()?;
    let resource = &mut config.resources.head;

    if let Some(r) = repository {
        resource.repository =
            RepositoryName::new(r).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    if let Some(i) = image {
        resource.image_name = ImageName::new(i).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    if let Some(t) = tag {
        ImageTag::new(t).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        resource.image_tag = EnvValue::literal(t);
    }

    let yaml = generate_template_yaml(&config)?;
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> Result<String> {
    let resource = config.resources.first();
    let tag = resource.image_tag.resolve()?;
    Ok(format!(
        r#"region:
  env: AWS_REGION
  default: eu-central-1
timeout: 15m
# Toolchain override (default: auto-detect Podman or Docker socket)
# runtime: docker
# socket: /var/run/docker.sock
resources:
  - name: {}
    repository: {}
    # region: us-west-2
    dockerfile_path: {}
    image_name: {}
    image_tag: {}
"#,
        resource.name,
        resource.repository,
        resource.dockerfile_path.display(),
        resource.image_name,
        tag
    ))
}
