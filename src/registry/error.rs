// ABOUTME: Errors from registry queries and writes.
// ABOUTME: Shared by the inspector, mutator and authenticator traits.

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// The tag already points at exactly this manifest.
    #[error("image already exists: {0}")]
    ImageAlreadyExists(String),

    /// The repository is immutable and the tag is taken.
    #[error("tag already exists in immutable repository: {0}")]
    TagImmutable(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("registry unreachable: {0}")]
    Unreachable(String),

    #[error("registry error: {0}")]
    Api(String),
}
