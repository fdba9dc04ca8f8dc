// ABOUTME: Local and remote image references.
// ABOUTME: Renders `name:tag` locally and `<account>.dkr.ecr.<region>.amazonaws.com/<repo>:<tag>` remotely.

use std::fmt;
use thiserror::Error;

use super::{ImageName, ImageTag, Region, RepositoryName};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("account id cannot be empty")]
    EmptyAccountId,

    #[error("invalid character in account id: '{0}'")]
    InvalidChar(char),
}

/// Hostname of the private ECR registry for one account and region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryHost(String);

impl RegistryHost {
    pub fn new(account_id: &str, region: &Region) -> Result<Self, ParseImageRefError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(ParseImageRefError::EmptyAccountId);
        }
        if let Some(c) = account_id
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        Ok(Self(format!("{}.dkr.ecr.{}.amazonaws.com", account_id, region)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: String,
}

impl ImageRef {
    /// Reference to the locally built image, `name:tag`.
    pub fn local(name: &ImageName, tag: &ImageTag) -> Self {
        Self {
            registry: None,
            name: name.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Reference to the image inside an ECR repository.
    pub fn remote(host: &RegistryHost, repository: &RepositoryName, tag: &ImageTag) -> Self {
        Self {
            registry: Some(host.to_string()),
            name: repository.to_string(),
            tag: tag.to_string(),
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Reference without the tag, as the push API expects it.
    pub fn repository(&self) -> String {
        match self.registry {
            Some(ref registry) => format!("{}/{}", registry, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}:{}", self.name, self.tag)
    }
}
