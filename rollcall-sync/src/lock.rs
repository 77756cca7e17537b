//! Per-destination run lock.
//!
//! Lives at `<home>/.rollcall/run/<name>.lock`, where `<name>` is the
//! destination id with unsafe characters replaced plus a short SHA-256
//! prefix of the raw id (two ids that sanitize alike still get distinct
//! files). The file is created with create-new semantics and removed when
//! the [`RunLock`] is dropped.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use rollcall_core::DestinationId;

use crate::error::{io_err, SyncError};

/// Locks older than this are treated as abandoned.
pub const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

const DIGEST_PREFIX: usize = 12;
const NAME_LIMIT: usize = 48;

/// Lock file payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockInfo {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub destination: String,
}

/// `<home>/.rollcall/run/<sanitized>-<digest>.lock`: pure, no I/O.
pub fn lock_path_at(home: &Path, destination: &DestinationId) -> PathBuf {
    let sanitized: String = destination
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(NAME_LIMIT)
        .collect();
    let digest = hex::encode(Sha256::digest(destination.as_str().as_bytes()));
    home.join(".rollcall")
        .join("run")
        .join(format!("{sanitized}-{}.lock", &digest[..DIGEST_PREFIX]))
}

/// Held run lock; released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock for `destination`.
    ///
    /// Returns `SyncError::Locked` if a live lock exists.
    pub fn acquire_at(home: &Path, destination: &DestinationId) -> Result<Self, SyncError> {
        let path = lock_path_at(home, destination);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let info = LockInfo {
            pid: std::process::id(),
            acquired_at: Utc::now(),
            destination: destination.to_string(),
        };
        let payload = serde_json::to_vec_pretty(&info)?;

        match create_new(&path, &payload) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !is_stale(&path)? {
                    return Err(SyncError::Locked {
                        destination: destination.to_string(),
                        path,
                    });
                }
                tracing::warn!("replacing abandoned run lock {}", path.display());
                std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
                create_new(&path, &payload).map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => SyncError::Locked {
                        destination: destination.to_string(),
                        path: path.clone(),
                    },
                    _ => io_err(&path, e),
                })?;
            }
            Err(e) => return Err(io_err(&path, e)),
        }

        tracing::debug!("acquired run lock {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current holder of the lock for `destination`, if any.
    pub fn holder_at(home: &Path, destination: &DestinationId) -> Result<Option<LockInfo>, SyncError> {
        let path = lock_path_at(home, destination);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&path, e)),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("failed to release run lock {}: {e}", self.path.display());
        }
    }
}

fn create_new(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(payload)
}

/// A lock is stale once its mtime is older than [`STALE_AFTER`].
fn is_stale(path: &Path) -> Result<bool, SyncError> {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        // Released between our create attempt and this check.
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(io_err(path, e)),
    };
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    Ok(age > STALE_AFTER)
}
