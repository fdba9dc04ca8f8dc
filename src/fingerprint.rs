// ABOUTME: Content fingerprint of the build instructions file.
// ABOUTME: SHA-256 over the raw Dockerfile bytes; files copied into the image are not covered.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name the build instructions file must have inside the build context.
pub const BUILD_INSTRUCTIONS_FILE: &str = "Dockerfile";

/// Length of a hex-encoded SHA-256 digest.
const FINGERPRINT_LEN: usize = 64;

/// Hex-encoded SHA-256 digest of the build instructions.
///
/// Used only for local drift detection. It is never sent to the registry.
/// Always 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Parse a previously recorded fingerprint.
    pub fn parse(value: &str) -> Result<Self, InvalidFingerprint> {
        if value.len() != FINGERPRINT_LEN {
            return Err(InvalidFingerprint::Length(value.chars().count()));
        }
        if let Some(c) = value.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(InvalidFingerprint::InvalidChar(c));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = InvalidFingerprint;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFingerprint {
    #[error("fingerprint must be 64 hex characters, got {0}")]
    Length(usize),

    #[error("fingerprint contains invalid character '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Path of the build instructions file inside a build context.
pub fn build_instructions_path(context: &Path) -> PathBuf {
    context.join(BUILD_INSTRUCTIONS_FILE)
}

/// Read the raw bytes of the build instructions file.
pub fn read_build_instructions(context: &Path) -> Result<Vec<u8>, FingerprintError> {
    let path = build_instructions_path(context);
    std::fs::read(&path).map_err(|source| FingerprintError::Unreadable { path, source })
}

/// Compute the fingerprint of the build context.
pub fn compute(context: &Path) -> Result<Fingerprint, FingerprintError> {
    let bytes = read_build_instructions(context)?;
    let fingerprint = Fingerprint::of_bytes(&bytes);
    tracing::debug!(
        context = %context.display(),
        fingerprint = fingerprint.short(),
        "computed build input fingerprint"
    );
    Ok(fingerprint)
}

/// Count entries in the build context other than the build instructions.
///
/// Changes to these entries do not change the fingerprint.
pub fn uncovered_entries(context: &Path) -> usize {
    std::fs::read_dir(context)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_name() != BUILD_INSTRUCTIONS_FILE)
                .count()
        })
        .unwrap_or(0)
}
