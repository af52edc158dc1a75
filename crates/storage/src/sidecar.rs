//! `<path>.jido.rev` revision sidecars (spec §4.3).

use crate::atomic::{atomic_write, AtomicWriteOptions};
use crate::snapshot::DiskSnapshot;
use jido_core::JidoError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: u64 = 1;

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".jido.rev");
    path.with_file_name(name)
}

/// Write the revision sidecar for `path`, merging `metadata` with
/// `schema_version`. Always written with `preserve_metadata = false`.
pub fn write_revision_sidecar(path: &Path, metadata: Value) -> Result<DiskSnapshot, JidoError> {
    let mut payload = match metadata {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    payload.insert("schema_version".to_string(), Value::from(SCHEMA_VERSION));

    let bytes = serde_json::to_vec_pretty(&Value::Object(payload))
        .map_err(|e| JidoError::filesystem(format!("sidecar serialize failed: {e}")))?;
    atomic_write(&sidecar_path(path), &bytes, &AtomicWriteOptions::default())
}

#[cfg(test)]
#[path = "sidecar_tests.rs"]
mod tests;
