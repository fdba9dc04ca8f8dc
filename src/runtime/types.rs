// ABOUTME: Toolchain flavours and socket locations.
// ABOUTME: Docker and Podman both serve the Docker-compatible API the builder talks to.

use serde::{Deserialize, Serialize};

/// The local container toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl RuntimeType {
    /// Socket path used when only the toolchain type is configured.
    pub fn default_socket(self) -> &'static str {
        match self {
            RuntimeType::Docker => "/var/run/docker.sock",
            RuntimeType::Podman => "/run/podman/podman.sock",
        }
    }
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeType::Docker => write!(f, "docker"),
            RuntimeType::Podman => write!(f, "podman"),
        }
    }
}

/// Toolchain chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub runtime_type: RuntimeType,
    pub socket_path: String,
}

/// Explicit toolchain selection from configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    /// Toolchain type (skips auto-detection).
    pub runtime: Option<RuntimeType>,
    /// Socket path (overrides the type's default).
    pub socket: Option<String>,
}
