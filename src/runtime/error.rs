// ABOUTME: Toolchain connection error types with SNAFU pattern.
// ABOUTME: Unifies detection and connection errors for programmatic handling.

use snafu::Snafu;

use super::builder::BuilderError;
use super::detection::DetectionError;

/// Unified error for finding and connecting to the local toolchain.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("toolchain detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("toolchain connection failed: {source}"))]
    Connection { source: BuilderError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No toolchain socket found on the system.
    NoRuntimeFound,
    /// DOCKER_HOST points somewhere the builder cannot reach.
    UnsupportedHost,
    /// Failed to connect to the toolchain socket.
    ConnectionFailed,
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { source } => match source {
                DetectionError::NoRuntimeFound => RuntimeErrorKind::NoRuntimeFound,
                DetectionError::UnsupportedHost(_) => RuntimeErrorKind::UnsupportedHost,
            },
            RuntimeError::Connection { .. } => RuntimeErrorKind::ConnectionFailed,
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<BuilderError> for RuntimeError {
    fn from(source: BuilderError) -> Self {
        RuntimeError::Connection { source }
    }
}
