//! Temporary batch-file lifecycle.
//!
//! Each dispatch writes its encoded lines to a uniquely named file, uploads
//! it, and releases it. Names are UUIDv7-based — time-ordered like the
//! legacy `sms_<millis>.txt` names but collision-free under concurrent
//! dispatches, so the shared directory needs no locking.
//!
//! In `publish` retention mode released files are kept and served under the
//! configured public base path; an external janitor is expected to
//! garbage-collect them by `created_at`.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use smsbridge_core::config::{ArtifactConfig, RetentionMode};
use smsbridge_core::{BridgeError, Result};

/// One written batch file, owned by exactly one dispatch.
#[derive(Debug, Clone)]
pub struct ArtifactHandle {
    pub path: PathBuf,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    retention: RetentionMode,
    public_base: String,
}

impl ArtifactStore {
    pub fn new(config: &ArtifactConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            retention: config.retention,
            public_base: config.public_prefix(),
        }
    }

    pub fn retention(&self) -> RetentionMode {
        self.retention
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` verbatim to a fresh file and return its handle.
    ///
    /// The directory is created if missing (idempotent). Bytes go to disk
    /// exactly as supplied — in particular no BOM: the gateway's parser
    /// treats one as part of the first phone number.
    pub async fn write(&self, content: &[u8]) -> Result<ArtifactHandle> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            BridgeError::Artifact(format!("creating {}: {e}", self.dir.display()))
        })?;

        let file_name = format!("sms_{}.txt", Uuid::now_v7());
        let path = self.dir.join(&file_name);

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| BridgeError::Artifact(format!("writing {}: {e}", path.display())))?;

        debug!(path = %path.display(), bytes = content.len(), "batch artifact written");

        Ok(ArtifactHandle {
            path,
            file_name,
            created_at: Utc::now(),
        })
    }

    /// Release an artifact after its gateway call finished (either way).
    ///
    /// Delete mode: remove the file; a failed unlink is logged, never
    /// escalated — delivery already happened or didn't, local bookkeeping
    /// doesn't change that. Publish mode: keep the file, return the
    /// public-relative path callers can fetch it from.
    pub async fn release(&self, handle: ArtifactHandle) -> Option<String> {
        match self.retention {
            RetentionMode::Delete => {
                if let Err(e) = tokio::fs::remove_file(&handle.path).await {
                    warn!(path = %handle.path.display(), error = %e, "failed to delete batch artifact");
                } else {
                    debug!(path = %handle.path.display(), "batch artifact deleted");
                }
                None
            }
            RetentionMode::Publish => Some(format!("{}/{}", self.public_base, handle.file_name)),
        }
    }
}
