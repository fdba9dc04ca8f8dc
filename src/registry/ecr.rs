// ABOUTME: Amazon ECR implementation of the registry capability traits.
// ABOUTME: Uses the AWS SDK for ECR and STS, scoped to the region of each call.

use super::auth::{RegistryAuth, RegistryAuthenticator, decode_authorization_token};
use super::error::RegistryError;
use super::inspector::{RegistryInspector, TagMutability};
use super::manifest::ImageManifest;
use super::mutator::RegistryMutator;
use crate::types::{ImageTag, Region, RepositoryName};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ecr::config::Region as AwsRegion;
use aws_sdk_ecr::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ecr::types::{ImageFailureCode, ImageIdentifier};
use tracing::debug;

/// Manifest formats requested from `BatchGetImage` so the stored format is returned unchanged.
const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    "application/vnd.docker.distribution.manifest.v2+json",
    "application/vnd.docker.distribution.manifest.list.v2+json",
    "application/vnd.oci.image.manifest.v1+json",
    "application/vnd.oci.image.index.v1+json",
    "application/vnd.docker.distribution.manifest.v1+json",
];

/// Error codes that mean the caller's credentials were rejected.
const UNAUTHORIZED_CODES: &[&str] = &[
    "AccessDeniedException",
    "UnrecognizedClientException",
    "ExpiredTokenException",
    "InvalidSignatureException",
    "InvalidClientTokenId",
];

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_sdk_error<E, R>(err: SdkError<E, R>, context: &str) -> RegistryError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{}: {}", context, DisplayErrorContext(&err));
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            RegistryError::Unreachable(message)
        }
        _ => match err.as_service_error().and_then(|e| e.code()) {
            Some(code) if UNAUTHORIZED_CODES.contains(&code) => {
                RegistryError::Unauthorized(message)
            }
            _ => RegistryError::Api(message),
        },
    }
}

fn tag_identifier(tag: &ImageTag) -> ImageIdentifier {
    ImageIdentifier::builder().image_tag(tag.as_str()).build()
}

fn tagged(repository: &RepositoryName, tag: &ImageTag) -> String {
    format!("{}:{}", repository, tag)
}

// =============================================================================
// EcrRegistry
// =============================================================================

/// Registry backed by Amazon ECR.
///
/// Credentials and transport are loaded once; every call is sent to the
/// region it names.
pub struct EcrRegistry {
    sdk_config: SdkConfig,
}

impl EcrRegistry {
    /// Load AWS configuration from the default provider chain.
    pub async fn connect() -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self { sdk_config }
    }

    fn ecr(&self, region: &Region) -> aws_sdk_ecr::Client {
        let config = aws_sdk_ecr::config::Builder::from(&self.sdk_config)
            .region(AwsRegion::new(region.to_string()))
            .build();
        aws_sdk_ecr::Client::from_conf(config)
    }

    fn sts(&self, region: &Region) -> aws_sdk_sts::Client {
        let config = aws_sdk_sts::config::Builder::from(&self.sdk_config)
            .region(AwsRegion::new(region.to_string()))
            .build();
        aws_sdk_sts::Client::from_conf(config)
    }
}

#[async_trait]
impl RegistryInspector for EcrRegistry {
    async fn repository_exists(
        &self,
        region: &Region,
        repository: &RepositoryName,
    ) -> Result<bool, RegistryError> {
        debug!(%repository, %region, "checking repository");
        match self
            .ecr(region)
            .describe_repositories()
            .repository_names(repository.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|s| s.is_repository_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(e) => Err(map_sdk_error(e, "describe repositories")),
        }
    }

    async fn repository_mutability(
        &self,
        region: &Region,
        repository: &RepositoryName,
    ) -> Result<TagMutability, RegistryError> {
        let output = self
            .ecr(region)
            .describe_repositories()
            .repository_names(repository.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|s| s.is_repository_not_found_exception())
                {
                    RegistryError::RepositoryNotFound(repository.to_string())
                } else {
                    map_sdk_error(e, "describe repositories")
                }
            })?;

        let repo = output
            .repositories()
            .first()
            .ok_or_else(|| RegistryError::RepositoryNotFound(repository.to_string()))?;

        let mutability = match repo.image_tag_mutability() {
            Some(setting) if setting.as_str().starts_with("IMMUTABLE") => TagMutability::Immutable,
            _ => TagMutability::Mutable,
        };
        debug!(%repository, %mutability, "fetched tag mutability");
        Ok(mutability)
    }

    async fn tag_exists(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<bool, RegistryError> {
        match self
            .ecr(region)
            .describe_images()
            .repository_name(repository.as_str())
            .image_ids(tag_identifier(tag))
            .send()
            .await
        {
            Ok(output) => Ok(!output.image_details().is_empty()),
            Err(e) => match e.as_service_error() {
                Some(s) if s.is_image_not_found_exception() => Ok(false),
                Some(s) if s.is_repository_not_found_exception() => {
                    Err(RegistryError::RepositoryNotFound(repository.to_string()))
                }
                _ => Err(map_sdk_error(e, "describe images")),
            },
        }
    }

    async fn get_manifest(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<ImageManifest, RegistryError> {
        let output = self
            .ecr(region)
            .batch_get_image()
            .repository_name(repository.as_str())
            .image_ids(tag_identifier(tag))
            .set_accepted_media_types(Some(
                ACCEPTED_MEDIA_TYPES.iter().map(|m| m.to_string()).collect(),
            ))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|s| s.is_repository_not_found_exception())
                {
                    RegistryError::RepositoryNotFound(repository.to_string())
                } else {
                    map_sdk_error(e, "batch get image")
                }
            })?;

        if let Some(manifest) = output
            .images()
            .first()
            .and_then(|image| image.image_manifest())
        {
            return Ok(ImageManifest::new(manifest));
        }

        let reason = output
            .failures()
            .first()
            .and_then(|f| f.failure_reason())
            .unwrap_or("no image returned");
        Err(RegistryError::ImageNotFound(format!(
            "{}: {}",
            tagged(repository, tag),
            reason
        )))
    }
}

#[async_trait]
impl RegistryMutator for EcrRegistry {
    async fn put_manifest(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
        manifest: &ImageManifest,
    ) -> Result<(), RegistryError> {
        debug!(%repository, %tag, "publishing manifest under tag");
        match self
            .ecr(region)
            .put_image()
            .repository_name(repository.as_str())
            .image_tag(tag.as_str())
            .image_manifest(manifest.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => match e.as_service_error() {
                Some(s) if s.is_image_already_exists_exception() => Err(
                    RegistryError::ImageAlreadyExists(tagged(repository, tag)),
                ),
                Some(s) if s.is_image_tag_already_exists_exception() => {
                    Err(RegistryError::TagImmutable(tagged(repository, tag)))
                }
                Some(s) if s.is_repository_not_found_exception() => {
                    Err(RegistryError::RepositoryNotFound(repository.to_string()))
                }
                _ => Err(map_sdk_error(e, "put image")),
            },
        }
    }

    async fn delete_tag(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<(), RegistryError> {
        debug!(%repository, %tag, "deleting tag");
        let output = self
            .ecr(region)
            .batch_delete_image()
            .repository_name(repository.as_str())
            .image_ids(tag_identifier(tag))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|s| s.is_repository_not_found_exception())
                {
                    RegistryError::RepositoryNotFound(repository.to_string())
                } else {
                    map_sdk_error(e, "batch delete image")
                }
            })?;

        // Per-image failures are reported in the body, not as an error.
        if let Some(failure) = output.failures().first() {
            let reason = failure.failure_reason().unwrap_or("unknown failure");
            return match failure.failure_code() {
                Some(ImageFailureCode::ImageNotFound)
                | Some(ImageFailureCode::ImageTagDoesNotMatchDigest) => Err(
                    RegistryError::ImageNotFound(format!("{}: {}", tagged(repository, tag), reason)),
                ),
                _ => Err(RegistryError::Api(format!(
                    "failed to delete {}: {}",
                    tagged(repository, tag),
                    reason
                ))),
            };
        }

        Ok(())
    }
}

#[async_trait]
impl RegistryAuthenticator for EcrRegistry {
    async fn account_id(&self, region: &Region) -> Result<String, RegistryError> {
        let output = self
            .sts(region)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "get caller identity"))?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| RegistryError::Api("caller identity has no account id".to_string()))
    }

    async fn authorization(&self, region: &Region) -> Result<RegistryAuth, RegistryError> {
        let output = self
            .ecr(region)
            .get_authorization_token()
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "get authorization token"))?;

        let data = output
            .authorization_data()
            .first()
            .ok_or_else(|| RegistryError::Unauthorized("no authorization data returned".to_string()))?;
        let token = data.authorization_token().ok_or_else(|| {
            RegistryError::Unauthorized("authorization data has no token".to_string())
        })?;

        decode_authorization_token(token, data.proxy_endpoint())
    }
}
