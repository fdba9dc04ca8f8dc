// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates resource names and the resource list.

use std::collections::HashSet;

use nonempty::NonEmpty;
use serde::Deserialize;

use super::ResourceConfig;

const MAX_RESOURCE_NAME: usize = 64;

/// Check a resource name: used as a state key and a lock file name.
pub fn validate_resource_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("resource name cannot be empty".to_string());
    }
    if name.len() > MAX_RESOURCE_NAME {
        return Err(format!(
            "resource name {} exceeds {} characters",
            name, MAX_RESOURCE_NAME
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
    {
        return Err(format!("invalid character '{}' in resource name {}", c, name));
    }
    if name.starts_with(['-', '_']) {
        return Err(format!("resource name {} must start with a letter or digit", name));
    }
    Ok(())
}

pub fn deserialize_resource_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    validate_resource_name(&s).map_err(serde::de::Error::custom)?;
    Ok(s)
}

pub fn deserialize_resources<'de, D>(deserializer: D) -> Result<NonEmpty<ResourceConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<ResourceConfig> = Vec::deserialize(deserializer)?;

    let mut seen = HashSet::new();
    for resource in &values {
        if !seen.insert(resource.name.as_str()) {
            return Err(serde::de::Error::custom(format!(
                "duplicate resource name: {}",
                resource.name
            )));
        }
    }

    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one resource is required"))
}
