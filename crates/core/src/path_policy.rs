//! The sole admission point for user-supplied paths (spec §4.2). Every
//! other component consumes already-resolved paths.

use crate::error::JidoError;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `workspace_root`, walking symlinks segment by
/// segment, and enforce that the result stays within the workspace.
///
/// A non-existent tail segment is accepted (used when creating new files).
/// Any symlink encountered along an *existing* prefix is followed; an
/// absolute link target replaces the accumulator, a relative one resolves
/// against the link's own parent directory.
pub fn resolve_path(path: &Path, workspace_root: &Path) -> Result<PathBuf, JidoError> {
    let workspace_root = absolute(workspace_root);
    let candidate = if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    };

    let mut accumulator = PathBuf::from(
        candidate
            .components()
            .next()
            .map(|c| c.as_os_str().to_owned())
            .unwrap_or_default(),
    );
    let remaining: Vec<Component> = candidate.components().skip(1).collect();

    for component in remaining {
        match component {
            Component::Normal(segment) => {
                accumulator.push(segment);
                accumulator = follow_symlinks(accumulator)?;
            }
            Component::ParentDir => {
                accumulator.pop();
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                accumulator.push(component.as_os_str());
            }
        }
    }

    if accumulator == workspace_root || accumulator.starts_with(&workspace_root) {
        Ok(accumulator)
    } else {
        Err(JidoError::new(
            crate::error::ErrorCode::Forbidden,
            format!(
                "path {} escapes workspace root {}",
                accumulator.display(),
                workspace_root.display()
            ),
        )
        .with_details(serde_json::json!({ "policy": "workspace_boundary" })))
    }
}

/// Best-effort absolute-ify without requiring the path to exist.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// If `path` exists and is a symlink, follow it (recursively, bounded) and
/// return the resolved accumulator. If it doesn't exist, it's a tail
/// segment for a not-yet-created file — return unchanged.
fn follow_symlinks(mut path: PathBuf) -> Result<PathBuf, JidoError> {
    const MAX_HOPS: usize = 32;
    for _ in 0..MAX_HOPS {
        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(_) => return Ok(path),
        };
        if !metadata.file_type().is_symlink() {
            return Ok(path);
        }
        let target = std::fs::read_link(&path)
            .map_err(|e| JidoError::filesystem(format!("read_link failed: {e}")))?;
        path = if target.is_absolute() {
            target
        } else {
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            parent.join(target)
        };
    }
    Err(JidoError::filesystem("too many levels of symbolic links"))
}

#[cfg(test)]
#[path = "path_policy_tests.rs"]
mod tests;
