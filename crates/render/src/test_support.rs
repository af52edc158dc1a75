//! Test doubles shared across crates, gated behind `test-support`.

use crate::adapter::{RenderAdapter, RenderAdapterRegistry};
use jido_core::JidoError;
use std::sync::Arc;

/// Wraps markdown in a fixed, deterministic HTML shell — good enough for
/// exercising the render queue without a real markdown converter.
pub struct EchoAdapter;

impl RenderAdapter for EchoAdapter {
    fn name(&self) -> &str {
        "echo"
    }

    fn render(&self, markdown: &str) -> Result<String, JidoError> {
        Ok(format!("<div data-adapter=\"echo\">{markdown}</div>"))
    }
}

pub fn echo_registry() -> RenderAdapterRegistry {
    let mut registry = RenderAdapterRegistry::new();
    registry.register(Arc::new(EchoAdapter));
    registry
}
