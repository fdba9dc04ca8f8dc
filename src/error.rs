// ABOUTME: Application-wide error types for ecrbuildpush.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::reconcile::ReconcileError;
use crate::registry::RegistryError;
use crate::runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("corrupt state file {path}: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("resource {resource} is locked by {holder} (pid {pid}) since {started_at}")]
    LockHeld {
        resource: String,
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
