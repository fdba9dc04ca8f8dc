// ABOUTME: Capability traits for the container registry and their ECR binding.
// ABOUTME: Defines RegistryInspector, RegistryMutator and RegistryAuthenticator.

mod auth;
mod ecr;
mod error;
mod inspector;
mod manifest;
mod mutator;

pub use auth::{RegistryAuth, RegistryAuthenticator, decode_authorization_token};
pub use ecr::EcrRegistry;
pub use error::RegistryError;
pub use inspector::{RegistryInspector, TagMutability};
pub use manifest::ImageManifest;
pub use mutator::RegistryMutator;

/// Everything the reconciler needs from a registry.
pub trait Registry: RegistryInspector + RegistryMutator + RegistryAuthenticator {}

impl<T: RegistryInspector + RegistryMutator + RegistryAuthenticator> Registry for T {}
