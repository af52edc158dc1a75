//! Crash-recovery checkpoints, one file per session (spec §4.7).

use crate::atomic::{atomic_write, AtomicWriteOptions};
use crate::snapshot::{epoch_ms_now, DiskSnapshot};
use jido_core::{Document, JidoError, SessionId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: u64 = 1;

/// The on-disk checkpoint payload for a single session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub schema_version: u64,
    pub session_id: SessionId,
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_snapshot: Option<DiskSnapshot>,
    pub captured_at_ms: u64,
}

impl Checkpoint {
    pub fn new(
        session_id: SessionId,
        document: Document,
        disk_snapshot: Option<DiskSnapshot>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            session_id,
            document,
            disk_snapshot,
            captured_at_ms: epoch_ms_now(),
        }
    }
}

/// Directory of per-session `<session_id>.checkpoint` files.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.checkpoint", session_id.as_str()))
    }

    /// Write (or overwrite) the checkpoint for `checkpoint.session_id`.
    ///
    /// Per spec §4.7, a write failure surfaces as a `FilesystemError` here;
    /// the session layer turns that into a non-fatal `failed` signal rather
    /// than aborting the edit that triggered it.
    pub fn write(&self, checkpoint: &Checkpoint) -> Result<(), JidoError> {
        let bytes = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| JidoError::filesystem(format!("checkpoint serialize failed: {e}")))?;
        atomic_write(
            &self.path_for(&checkpoint.session_id),
            &bytes,
            &AtomicWriteOptions::default(),
        )?;
        Ok(())
    }

    /// Load the checkpoint for `session_id`, if one exists.
    pub fn load(&self, session_id: &SessionId) -> Result<Option<Checkpoint>, JidoError> {
        let path = self.path_for(session_id);
        match fs::read(&path) {
            Ok(bytes) => {
                let checkpoint: Checkpoint = serde_json::from_slice(&bytes).map_err(|e| {
                    JidoError::parse_failed(format!("checkpoint payload corrupt: {e}"))
                })?;
                Ok(Some(checkpoint))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JidoError::filesystem(format!(
                "checkpoint read failed for {}: {e}",
                path.display()
            ))),
        }
    }

    /// Remove the checkpoint for `session_id`, if present. Idempotent.
    pub fn discard(&self, session_id: &SessionId) -> Result<(), JidoError> {
        let path = self.path_for(session_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JidoError::filesystem(format!(
                "checkpoint discard failed for {}: {e}",
                path.display()
            ))),
        }
    }

    /// Enumerate `*.checkpoint` files, returning `(session_id, path)` pairs
    /// sorted by session id for deterministic iteration.
    pub fn list_recovery_candidates(&self) -> Result<Vec<(SessionId, PathBuf)>, JidoError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(JidoError::filesystem(format!(
                    "checkpoint dir read failed for {}: {e}",
                    self.dir.display()
                )))
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| JidoError::filesystem(format!("checkpoint dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("checkpoint") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            out.push((SessionId::from(stem), path));
        }
        out.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        Ok(out)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
