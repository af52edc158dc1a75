use jido_core::{Document, JidoError};
use tracing::trace;

const DEFAULT_LIMIT: usize = 100;

/// A single undo/redo stack entry: the document as it stood before the
/// action that pushed it, plus enough metadata to log what happened.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub document: Document,
    pub action: String,
    pub source: String,
}

/// Snapshot of history sizing, returned by [`History::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub limit: usize,
}

/// Two bounded stacks of document snapshots (spec §4.4).
#[derive(Debug)]
pub struct History {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    /// `limit` is clamped to a minimum of 1.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Push `document_before_change` onto the undo stack and clear redo.
    /// Evicts the oldest undo entry once `limit` is exceeded.
    pub fn record(&mut self, document_before_change: Document, action: impl Into<String>, source: impl Into<String>) {
        let action = action.into();
        let source = source.into();
        trace!(action = %action, source = %source, undo_depth = self.undo.len() + 1, "history: record");

        self.undo.push(HistoryEntry {
            document: document_before_change,
            action,
            source,
        });
        if self.undo.len() > self.limit {
            self.undo.remove(0);
        }
        if !self.redo.is_empty() {
            trace!(cleared = self.redo.len(), "history: redo cleared");
        }
        self.redo.clear();
    }

    /// Pop the most recent undo entry, pushing `current_doc` onto redo.
    /// Returns the popped document. Fails with `conflict{history}` when
    /// the undo stack is empty.
    pub fn undo(&mut self, current_doc: Document) -> Result<Document, JidoError> {
        let Some(entry) = self.undo.pop() else {
            return Err(JidoError::conflict("nothing to undo")
                .with_details(serde_json::json!({ "scope": "history" })));
        };
        trace!(action = %entry.action, undo_depth = self.undo.len(), "history: undo");
        self.push_redo(current_doc, entry.action.clone(), entry.source.clone());
        Ok(entry.document)
    }

    /// Symmetric to [`History::undo`].
    pub fn redo(&mut self, current_doc: Document) -> Result<Document, JidoError> {
        let Some(entry) = self.redo.pop() else {
            return Err(JidoError::conflict("nothing to redo")
                .with_details(serde_json::json!({ "scope": "history" })));
        };
        trace!(action = %entry.action, redo_depth = self.redo.len(), "history: redo");
        self.undo.push(HistoryEntry {
            document: current_doc,
            action: entry.action.clone(),
            source: entry.source.clone(),
        });
        if self.undo.len() > self.limit {
            self.undo.remove(0);
        }
        Ok(entry.document)
    }

    fn push_redo(&mut self, document: Document, action: String, source: String) {
        self.redo.push(HistoryEntry {
            document,
            action,
            source,
        });
        if self.redo.len() > self.limit {
            self.redo.remove(0);
        }
    }

    /// Empty both stacks. Invoked on load and recover.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: !self.undo.is_empty(),
            can_redo: !self.redo.is_empty(),
            undo_depth: self.undo.len(),
            redo_depth: self.redo.len(),
            limit: self.limit,
        }
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
