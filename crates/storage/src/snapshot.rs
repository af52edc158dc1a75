//! `(path, mtime, size, sha256, captured_at_ms)` capturing on-disk
//! identity (spec §3 `DiskSnapshot`).

use jido_core::JidoError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSnapshot {
    pub path: PathBuf,
    pub mtime_ms: u64,
    pub size: u64,
    pub sha256: String,
    pub captured_at_ms: u64,
}

impl DiskSnapshot {
    /// Capture the current on-disk identity of `path`.
    pub fn capture(path: &Path) -> Result<Self, JidoError> {
        let metadata =
            fs::metadata(path).map_err(|e| JidoError::filesystem(format!("stat failed: {e}")))?;
        let bytes =
            fs::read(path).map_err(|e| JidoError::filesystem(format!("read failed: {e}")))?;
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(Self {
            path: path.to_path_buf(),
            mtime_ms,
            size: metadata.len(),
            sha256: hex_sha256(&bytes),
            captured_at_ms: epoch_ms_now(),
        })
    }
}

pub(crate) fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(out, "{b:02x}");
    }
    out
}

pub(crate) fn epoch_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
