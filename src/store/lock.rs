// ABOUTME: Per-resource lock to prevent concurrent operations on the same image.
// ABOUTME: Uses atomic file creation with lock info stored in .ecrbuildpush/<resource>.lock.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Information about who holds a resource lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Resource being reconciled.
    pub resource: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(resource: &str) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            resource: resource.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Path to the lock file for a resource.
    pub fn lock_path(state_dir: &Path, resource: &str) -> PathBuf {
        state_dir.join(format!("{}.lock", resource))
    }
}

/// A held resource lock.
#[derive(Debug)]
pub struct ResourceLock {
    path: PathBuf,
    released: bool,
}

impl ResourceLock {
    /// Acquire the lock for `resource`.
    ///
    /// Uses create-new file semantics for atomic acquisition (no TOCTOU race).
    /// Returns an error if the lock is already held by another process.
    /// Auto-breaks stale locks (>1 hour) with a warning.
    pub fn acquire(state_dir: &Path, resource: &str, force: bool) -> Result<Self> {
        std::fs::create_dir_all(state_dir)?;
        let path = LockInfo::lock_path(state_dir, resource);
        let info = LockInfo::new(resource);

        if Self::try_create(&path, &info)? {
            return Ok(Self {
                path,
                released: false,
            });
        }

        Self::check_existing_lock(&path, force)?;

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if !Self::try_create(&path, &info)? {
            return Err(Error::LockHeld {
                resource: resource.to_string(),
                holder: "another process".to_string(),
                pid: 0,
                started_at: Utc::now(),
            });
        }

        Ok(Self {
            path,
            released: false,
        })
    }

    fn try_create(path: &Path, info: &LockInfo) -> Result<bool> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.write_all(serde_json::to_string(info)?.as_bytes())?;
        Ok(true)
    }

    /// Decide whether an existing lock may be broken (stale, forced, or corrupted).
    ///
    /// Returns `LockHeld` when it may not.
    fn check_existing_lock(path: &Path, force: bool) -> Result<()> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                tracing::warn!("Lock info unreadable, breaking lock");
                return Ok(());
            }
        };

        match serde_json::from_str::<LockInfo>(&content) {
            Ok(existing) if force => {
                tracing::warn!(
                    "Breaking lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                Ok(())
            }
            Ok(existing) if existing.is_stale() => {
                tracing::warn!(
                    "Auto-breaking stale lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                Ok(())
            }
            Ok(existing) => Err(Error::LockHeld {
                resource: existing.resource,
                holder: existing.holder,
                pid: existing.pid,
                started_at: existing.started_at,
            }),
            Err(_) => {
                tracing::warn!("Lock info corrupted, breaking lock");
                Ok(())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ResourceLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_info_creates_with_current_host_and_pid() {
        let info = LockInfo::new("web");

        assert_eq!(info.resource, "web");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[test]
    fn lock_path_uses_state_dir() {
        assert_eq!(
            LockInfo::lock_path(Path::new(".ecrbuildpush"), "web"),
            PathBuf::from(".ecrbuildpush/web.lock")
        );
    }

    #[test]
    fn fresh_lock_is_not_stale() {
        assert!(!LockInfo::new("web").is_stale());
    }

    #[test]
    fn old_lock_is_stale() {
        let mut info = LockInfo::new("web");
        info.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.is_stale());
    }
}
