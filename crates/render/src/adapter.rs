//! Pluggable markdown-to-HTML renderer adapters.
//!
//! The actual markdown converter is an external collaborator (spec §0);
//! this crate only defines the seam and the deterministic fallback.

use crate::change_tracker::ChangeDecision;
use jido_core::JidoError;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-call rendering options.
#[derive(Debug, Clone, Default)]
pub struct RenderOpts {
    /// Adapter to use; `None` selects the registry default.
    pub adapter: Option<String>,
    /// Body as it stood at the previous successful render, for the change
    /// tracker's incremental/full decision.
    pub previous_body: Option<String>,
    /// The session's last known-good preview, used to synthesize a
    /// fallback preview if this render fails.
    pub last_good_preview: Option<String>,
}

/// A rendered preview plus the metadata the session attaches to its
/// `rendered`/`updated` signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub html: String,
    pub metadata: PreviewMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewMetadata {
    pub adapter: String,
    pub fallback: bool,
    pub decision: ChangeDecision,
    pub changed_lines: usize,
    pub total_lines: usize,
}

/// A pluggable markdown-to-HTML converter.
pub trait RenderAdapter: Send + Sync {
    fn name(&self) -> &str;
    fn render(&self, markdown: &str) -> Result<String, JidoError>;
}

/// Named set of adapters plus a default selection.
#[derive(Clone, Default)]
pub struct RenderAdapterRegistry {
    adapters: HashMap<String, Arc<dyn RenderAdapter>>,
    default_adapter: Option<String>,
}

impl RenderAdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn RenderAdapter>) -> &mut Self {
        let name = adapter.name().to_string();
        if self.default_adapter.is_none() {
            self.default_adapter = Some(name.clone());
        }
        self.adapters.insert(name, adapter);
        self
    }

    pub fn set_default(&mut self, name: impl Into<String>) -> &mut Self {
        self.default_adapter = Some(name.into());
        self
    }

    /// Resolve `requested` (or the registry default, if `None`) to an
    /// adapter. Returns `None` if unregistered or unavailable — the caller
    /// treats this as a fallback trigger, not an error.
    pub fn resolve(&self, requested: Option<&str>) -> Option<Arc<dyn RenderAdapter>> {
        let name = requested.or(self.default_adapter.as_deref())?;
        self.adapters.get(name).cloned()
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
