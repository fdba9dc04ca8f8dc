// ABOUTME: ECR repository name validation.
// ABOUTME: Lowercase path components separated by '/', with '.', '_' and '-' inside.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryNameError {
    #[error("repository name cannot be empty")]
    Empty,

    #[error("repository name must be between 2 and 256 characters")]
    InvalidLength,

    #[error("repository name must be lowercase")]
    NotLowercase,

    #[error("invalid character in repository name: '{0}'")]
    InvalidChar(char),

    #[error("repository name components must start and end with a letter or digit")]
    InvalidComponent,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub fn new(value: &str) -> Result<Self, RepositoryNameError> {
        if value.is_empty() {
            return Err(RepositoryNameError::Empty);
        }

        if value.len() < 2 || value.len() > 256 {
            return Err(RepositoryNameError::InvalidLength);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(RepositoryNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && !matches!(c, '.' | '_' | '-' | '/')
            {
                return Err(RepositoryNameError::InvalidChar(c));
            }
        }

        let valid_components = value.split('/').all(|component| {
            let mut chars = component.chars();
            let first = chars.next();
            let last = component.chars().last();
            matches!((first, last), (Some(f), Some(l)) if f.is_ascii_alphanumeric() && l.is_ascii_alphanumeric())
        });
        if !valid_components {
            return Err(RepositoryNameError::InvalidComponent);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RepositoryName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RepositoryName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
