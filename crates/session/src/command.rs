//! The per-session command surface (spec §6).

use crate::safety::SafetyPolicy;
use indexmap::IndexMap;
use jido_core::{BodyPatch, FrontmatterMode, Scalar};
use jido_render::RenderOpts;
use jido_storage::DiskSnapshot;
use std::path::PathBuf;

/// How `save` should resolve an on-disk divergence from its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    #[default]
    Reject,
    Overwrite,
    MergeHook,
}

/// Caller-supplied merge strategy for `save{on_conflict: merge_hook}`:
/// given the baseline body and the diverged on-disk body, produce the
/// body to persist, or fail to fall back to `reject` semantics.
pub type MergeHook = Box<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

#[derive(Default)]
pub struct SaveParams {
    pub path: Option<PathBuf>,
    pub on_conflict: OnConflict,
    pub merge_hook: Option<MergeHook>,
    /// Override the baseline snapshot divergence is checked against;
    /// defaults to the session's current `disk_snapshot`.
    pub baseline: Option<DiskSnapshot>,
    pub preserve_metadata: bool,
    pub revision_metadata: Option<serde_json::Value>,
    pub safety: Option<SafetyPolicy>,
}

pub struct LoadParams {
    pub path: PathBuf,
}

pub struct UpdateFrontmatterParams {
    pub changes: IndexMap<String, Scalar>,
    pub mode: FrontmatterMode,
    pub optimistic: bool,
}

impl Default for UpdateFrontmatterParams {
    fn default() -> Self {
        Self {
            changes: IndexMap::new(),
            mode: FrontmatterMode::Merge,
            optimistic: true,
        }
    }
}

pub struct UpdateBodyParams {
    pub patch: BodyPatch,
    pub optimistic: bool,
}

impl UpdateBodyParams {
    pub fn full(body: impl Into<String>) -> Self {
        Self {
            patch: BodyPatch::Full(body.into()),
            optimistic: true,
        }
    }
}

#[derive(Default)]
pub struct RenderParams {
    pub render_opts: RenderOpts,
    pub safety: Option<SafetyPolicy>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverParams {
    pub force: bool,
}
