// ABOUTME: Locates the local toolchain socket.
// ABOUTME: Explicit config wins, then DOCKER_HOST, then Podman and Docker default sockets.

use super::types::{RuntimeConfig, RuntimeInfo, RuntimeType};
use std::path::Path;

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Error during toolchain detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container toolchain found (checked DOCKER_HOST, Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("unsupported DOCKER_HOST {0}: only unix:// sockets are supported")]
    UnsupportedHost(String),
}

/// Pick the toolchain socket, honoring explicit configuration first.
pub fn resolve_runtime(config: &RuntimeConfig) -> Result<RuntimeInfo, DetectionError> {
    match (config.runtime, config.socket.as_ref()) {
        (Some(runtime_type), socket) => Ok(RuntimeInfo {
            runtime_type,
            socket_path: socket
                .cloned()
                .unwrap_or_else(|| runtime_type.default_socket().to_string()),
        }),
        (None, Some(socket)) => Ok(RuntimeInfo {
            runtime_type: guess_type(socket),
            socket_path: socket.clone(),
        }),
        (None, None) => detect_local(),
    }
}

/// Detect the toolchain on the local system.
///
/// Detection order:
/// 1. `DOCKER_HOST` (unix sockets only)
/// 2. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 3. Rootful Podman socket (`/run/podman/podman.sock`)
/// 4. Docker socket (`/var/run/docker.sock`)
pub fn detect_local() -> Result<RuntimeInfo, DetectionError> {
    if let Ok(host) = std::env::var("DOCKER_HOST")
        && !host.is_empty()
    {
        let socket = host
            .strip_prefix("unix://")
            .ok_or_else(|| DetectionError::UnsupportedHost(host.clone()))?;
        return Ok(RuntimeInfo {
            runtime_type: guess_type(socket),
            socket_path: socket.to_string(),
        });
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(RuntimeInfo {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn guess_type(socket: &str) -> RuntimeType {
    if socket.contains("podman") {
        RuntimeType::Podman
    } else {
        RuntimeType::Docker
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}
