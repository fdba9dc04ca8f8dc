// ABOUTME: Bollard-based image builder.
// ABOUTME: Supports both Docker and Podman via Docker-compatible API.

use super::builder::{BuilderError, ImageBuilder, PushReport};
use super::context::build_context_archive;
use super::types::{RuntimeInfo, RuntimeType};
use crate::fingerprint::BUILD_INSTRUCTIONS_FILE;
use crate::registry::RegistryAuth;
use crate::types::ImageRef;
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::query_parameters::{BuildImageOptions, PushImageOptions, TagImageOptions};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{Either, Full};
use std::path::{Path, PathBuf};

/// Seconds a single API request may take; builds of large images are slow.
const REQUEST_TIMEOUT_SECS: u64 = 3600;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_build_error(e: bollard::errors::Error, image: &ImageRef) -> BuilderError {
    BuilderError::BuildFailed(format!("{}: {}", image, e))
}

fn map_tag_error(e: bollard::errors::Error, source: &ImageRef) -> BuilderError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => {
            BuilderError::TagFailed(format!("local image {} not found: {}", source, message))
        }
        _ => BuilderError::TagFailed(format!("{}: {}", source, e)),
    }
}

/// How a push progress line finished a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerOutcome {
    Uploaded,
    Reused,
}

fn layer_outcome(status: &str) -> Option<LayerOutcome> {
    match status {
        "Pushed" => Some(LayerOutcome::Uploaded),
        "Layer already exists" => Some(LayerOutcome::Reused),
        _ => None,
    }
}

/// Error text embedded in a progress message.
///
/// The error fields of push messages differ between API versions, so they
/// are read from the message's wire form.
fn progress_error<T: serde::Serialize>(info: &T) -> Option<String> {
    let value = serde_json::to_value(info).ok()?;
    let detail = value
        .get("errorDetail")
        .or_else(|| value.get("error_detail"))
        .and_then(|d| d.get("message"))
        .and_then(|m| m.as_str());
    let error = value.get("error").and_then(|e| e.as_str());
    detail.or(error).map(str::to_string)
}

// =============================================================================
// BollardBuilder
// =============================================================================

/// Image builder using bollard.
///
/// Supports both Docker and Podman via Docker-compatible API.
pub struct BollardBuilder {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardBuilder {
    /// Create a new BollardBuilder from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to a local toolchain using detected runtime info.
    ///
    /// Use with `resolve_runtime()` to pick the socket.
    pub fn connect(info: &RuntimeInfo) -> Result<Self, BuilderError> {
        let client = Docker::connect_with_unix(
            &info.socket_path,
            REQUEST_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| BuilderError::Unavailable(format!("{}: {}", info.socket_path, e)))?;
        Ok(Self::new(client, info.runtime_type))
    }
}

#[async_trait]
impl ImageBuilder for BollardBuilder {
    async fn toolchain_running(&self) -> Result<(), BuilderError> {
        self.client
            .ping()
            .await
            .map_err(|e| BuilderError::Unavailable(format!("{} not running: {}", self.runtime_type, e)))?;
        Ok(())
    }

    async fn build_image(&self, image: &ImageRef, context: &Path) -> Result<(), BuilderError> {
        let context: PathBuf = context.to_path_buf();
        let tar_data = tokio::task::spawn_blocking(move || build_context_archive(&context))
            .await
            .map_err(|e| BuilderError::Context(e.to_string()))?
            .map_err(|e| BuilderError::Context(e.to_string()))?;

        let options = BuildImageOptions {
            dockerfile: BUILD_INSTRUCTIONS_FILE.to_string(),
            t: Some(image.to_string()),
            ..Default::default()
        };

        let body = Either::Left(Full::new(Bytes::from(tar_data)));
        let mut build_stream = self.client.build_image(options, None, Some(body));

        while let Some(result) = build_stream.next().await {
            let output = result.map_err(|e| map_build_error(e, image))?;
            if let Some(error_detail) = output.error_detail {
                let message = error_detail
                    .message
                    .unwrap_or_else(|| "unknown build error".to_string());
                return Err(BuilderError::BuildFailed(format!("{}: {}", image, message)));
            }
            if let Some(line) = output.stream.as_deref().map(str::trim)
                && !line.is_empty()
            {
                tracing::debug!(image = %image, "{}", line);
            }
        }

        Ok(())
    }

    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), BuilderError> {
        let options = TagImageOptions {
            repo: Some(target.repository()),
            tag: Some(target.tag().to_string()),
        };

        self.client
            .tag_image(&source.to_string(), Some(options))
            .await
            .map_err(|e| map_tag_error(e, source))
    }

    async fn push_image(
        &self,
        image: &ImageRef,
        auth: &RegistryAuth,
    ) -> Result<PushReport, BuilderError> {
        let reference = image.to_string();
        let options = PushImageOptions {
            tag: Some(image.tag().to_string()),
            ..Default::default()
        };
        let credentials = DockerCredentials {
            username: Some(auth.username.clone()),
            password: Some(auth.password.clone()),
            serveraddress: auth.server.clone(),
            ..Default::default()
        };

        let mut report = PushReport::default();
        let mut stream =
            self.client
                .push_image(&image.repository(), Some(options), Some(credentials));

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| BuilderError::PushFailed {
                reference: reference.clone(),
                message: e.to_string(),
                layers_pushed: report.layers_pushed,
            })?;
            if let Some(message) = progress_error(&info) {
                return Err(BuilderError::PushFailed {
                    reference,
                    message,
                    layers_pushed: report.layers_pushed,
                });
            }
            match info.status.as_deref().and_then(layer_outcome) {
                Some(LayerOutcome::Uploaded) => report.layers_pushed += 1,
                Some(LayerOutcome::Reused) => report.layers_reused += 1,
                None => {}
            }
        }

        tracing::debug!(
            image = %reference,
            pushed = report.layers_pushed,
            reused = report.layers_reused,
            "push complete"
        );
        Ok(report)
    }
}
