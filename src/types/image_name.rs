// ABOUTME: Local image name validation.
// ABOUTME: The repository component of a local reference like `myapp` or `team/myapp`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageNameError {
    #[error("image name cannot be empty")]
    Empty,

    #[error("image name must be lowercase")]
    NotLowercase,

    #[error("invalid character in image name: '{0}'")]
    InvalidChar(char),

    #[error("image name cannot start or end with a separator")]
    DanglingSeparator,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageName(String);

impl ImageName {
    pub fn new(value: &str) -> Result<Self, ImageNameError> {
        if value.is_empty() {
            return Err(ImageNameError::Empty);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ImageNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && !matches!(c, '.' | '_' | '-' | '/')
            {
                return Err(ImageNameError::InvalidChar(c));
            }
        }

        let is_separator = |c: char| matches!(c, '.' | '_' | '-' | '/');
        if value.starts_with(is_separator) || value.ends_with(is_separator) {
            return Err(ImageNameError::DanglingSeparator);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ImageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ImageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
