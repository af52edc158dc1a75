//! Shared test builders, gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::document::{Document, ParseOptions};
use crate::ids::SessionId;
use std::path::PathBuf;

/// The literal document used in spec §8 scenario S1.
pub fn s1_fixture_raw() -> &'static str {
    "---\ntitle: \"A\"\n---\nBody0\n"
}

pub fn parsed_s1_document() -> Document {
    Document::parse(s1_fixture_raw(), ParseOptions::default()).expect("s1 fixture parses")
}

pub fn session_id_for(path: impl Into<PathBuf>) -> SessionId {
    SessionId::for_path(&path.into())
}
