//! Atomic, divergence-aware writes to tracked paths (spec §4.3).
//!
//! Every filesystem write to a path the session model tracks funnels
//! through [`atomic_write`]; no other component writes a tracked path
//! directly.

use crate::snapshot::{epoch_ms_now, hex_sha256, DiskSnapshot};
use jido_core::JidoError;
use serde_json::json;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{MetadataExt, PermissionsExt};

/// Options governing a single [`atomic_write`] call.
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteOptions {
    /// Best-effort chmod/chown of the temp file to match the prior target.
    pub preserve_metadata: bool,
}

/// Result of comparing a baseline [`DiskSnapshot`] against current disk state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divergence {
    /// Current content matches the baseline (or the target is new).
    Ok,
    /// Current content disagrees with the baseline by hash.
    Conflict {
        baseline_hash: String,
        current_hash: String,
    },
}

/// Write `bytes` to `path` atomically: write to a sibling temp file, fsync,
/// rename over the target, then fsync the parent directory.
///
/// On failure after the temp file is created, the temp file is removed and
/// the target is left untouched (or absent, if it never existed).
pub fn atomic_write(
    path: &Path,
    bytes: &[u8],
    opts: &AtomicWriteOptions,
) -> Result<DiskSnapshot, JidoError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|e| stage_error("ensure_parent_dir", path, &e))?;

    let prior_metadata = fs::metadata(path).ok();

    let unique = format!("{}.{}", std::process::id(), epoch_ms_now());
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path: PathBuf = parent.join(format!("{file_name}.tmp.{unique}"));

    if let Err(e) = write_and_sync(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(stage_error("write_temp", path, &e));
    }

    if opts.preserve_metadata {
        if let Some(meta) = &prior_metadata {
            if let Err(e) = apply_preserved_metadata(&tmp_path, meta) {
                let _ = fs::remove_file(&tmp_path);
                return Err(stage_error("preserve_metadata", path, &e));
            }
        }
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(stage_error("rename", path, &e));
    }

    let _ = sync_dir(parent);

    DiskSnapshot::capture(path)
}

fn write_and_sync(tmp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn apply_preserved_metadata(tmp_path: &Path, meta: &fs::Metadata) -> std::io::Result<()> {
    fs::set_permissions(tmp_path, fs::Permissions::from_mode(meta.mode()))?;
    // chown requires privileges we may not hold; best-effort only.
    let _ = (meta.uid(), meta.gid());
    Ok(())
}

#[cfg(not(unix))]
fn apply_preserved_metadata(_tmp_path: &Path, _meta: &fs::Metadata) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn stage_error(stage: &str, path: &Path, e: &std::io::Error) -> JidoError {
    JidoError::filesystem(format!("{stage} failed for {}: {e}", path.display()))
        .with_details(json!({ "stage": stage, "path": path.to_string_lossy() }))
}

/// Compare `path`'s current on-disk identity against `baseline`.
///
/// A missing target is treated as "no divergence" (new file). Equal
/// `(mtime, size)` short-circuits to `Ok` without reading content.
pub fn detect_divergence(
    path: &Path,
    baseline: Option<&DiskSnapshot>,
) -> Result<Divergence, JidoError> {
    let Some(baseline) = baseline else {
        return Ok(Divergence::Ok);
    };

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Divergence::Ok),
        Err(e) => return Err(stage_error("stat", path, &e)),
    };
    let mtime_ms = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    if mtime_ms == baseline.mtime_ms && metadata.len() == baseline.size {
        return Ok(Divergence::Ok);
    }

    let bytes = fs::read(path).map_err(|e| stage_error("read", path, &e))?;
    let current_hash = hex_sha256(&bytes);
    if current_hash == baseline.sha256 {
        return Ok(Divergence::Ok);
    }
    Ok(Divergence::Conflict {
        baseline_hash: baseline.sha256.clone(),
        current_hash,
    })
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
