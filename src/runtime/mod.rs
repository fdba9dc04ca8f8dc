// ABOUTME: Local image toolchain: Docker or Podman reached through the Docker-compatible API.
// ABOUTME: Exposes the ImageBuilder capability, its bollard implementation and socket detection.

mod bollard;
mod builder;
mod context;
mod detection;
mod error;
mod types;

pub use self::bollard::BollardBuilder;
pub use builder::{BuilderError, ImageBuilder, PushReport};
pub use context::build_context_archive;
pub use detection::{DetectionError, detect_local, resolve_runtime};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use types::{RuntimeConfig, RuntimeInfo, RuntimeType};
