//! Typed `value` payloads for each command's [`jido_core::ActionResult`].

use jido_render::{ChangeDecision, Preview};
use jido_storage::DiskSnapshot;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub revision: u64,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub revision: u64,
    pub path: PathBuf,
    pub disk_snapshot: DiskSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub revision: u64,
    pub dirty: bool,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    pub html: String,
    pub adapter: String,
    pub fallback: bool,
    pub decision: String,
    pub changed_lines: usize,
    pub total_lines: usize,
}

impl From<Preview> for RenderOutcome {
    fn from(preview: Preview) -> Self {
        Self {
            html: preview.html,
            adapter: preview.metadata.adapter,
            fallback: preview.metadata.fallback,
            decision: match preview.metadata.decision {
                ChangeDecision::Incremental => "incremental".to_string(),
                ChangeDecision::Full => "full".to_string(),
            },
            changed_lines: preview.metadata.changed_lines,
            total_lines: preview.metadata.total_lines,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryStateOutcome {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub limit: usize,
}

impl From<jido_history::HistoryState> for HistoryStateOutcome {
    fn from(state: jido_history::HistoryState) -> Self {
        Self {
            can_undo: state.can_undo,
            can_redo: state.can_redo,
            undo_depth: state.undo_depth,
            redo_depth: state.redo_depth,
            limit: state.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UndoRedoOutcome {
    pub revision: u64,
    pub history: HistoryStateOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoverOutcome {
    pub revision: u64,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryAvailableSummary {
    pub session_id: String,
    pub captured_at_ms: u64,
    pub path: Option<PathBuf>,
}
