//! Newtype identifiers shared across the session/registry/signal crates.

crate::define_id! {
    /// Deterministic session identifier, derived from a document's
    /// canonical path (`"file-" + hex(sha256(path))[0..20]`, spec §4.8).
    pub struct SessionId;
}

crate::define_id! {
    /// Opaque bearer token proving optimistic ownership of a session's
    /// write capability (spec §3 `LockState`, §4.8).
    pub struct LockToken;
}

crate::define_id! {
    /// Caller-supplied or generated correlation id threaded through a
    /// command's `ActionMetadata` and any signals it emits.
    pub struct CorrelationId;
}

use sha2::{Digest, Sha256};

impl SessionId {
    /// `session_id_for_path` from spec §4.8.
    pub fn for_path(path: &std::path::Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        let digest = hasher.finalize();
        let hex = hex_encode(&digest);
        Self::new(format!("file-{}", &hex[..20]))
    }
}

impl LockToken {
    /// `url_base64(sha256("<session_id>:<owner>:<unique>"))[0..24]` from spec §4.8.
    pub fn derive(session_id: &SessionId, owner: &str, unique: &str) -> Self {
        use base64::Engine;
        let mut hasher = Sha256::new();
        hasher.update(session_id.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(owner.as_bytes());
        hasher.update(b":");
        hasher.update(unique.as_bytes());
        let digest = hasher.finalize();
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
        Self::new(encoded[..24.min(encoded.len())].to_string())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
