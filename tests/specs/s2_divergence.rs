//! S2 — external divergence (spec §8).

use crate::prelude::registry_at;
use jido_core::ErrorCode;
use jido_session::{LoadParams, OnConflict, SaveParams, UpdateBodyParams};

#[test]
fn save_reject_on_external_divergence_leaves_disk_untouched() {
    let workspace = tempfile::tempdir().expect("workspace");
    let doc_path = workspace.path().join("doc.md");
    std::fs::write(&doc_path, "---\ntitle: \"A\"\n---\nBody0\n").expect("seed");

    let (registry, _clock, _checkpoints) = registry_at(workspace.path());
    let session_id = registry
        .ensure_session_by_path(std::path::Path::new("doc.md"), Default::default())
        .expect("ensure session");

    registry
        .load(&session_id, LoadParams { path: "doc.md".into() }, None)
        .expect("dispatch load");
    registry
        .update_body(&session_id, UpdateBodyParams::full("EditedInSession\n"), None)
        .expect("dispatch update_body");

    let external_content = "---\ntitle: \"A\"\n---\nExternallyOverwritten\n";
    std::fs::write(&doc_path, external_content).expect("external overwrite");

    let save_params = SaveParams {
        on_conflict: OnConflict::Reject,
        ..Default::default()
    };
    let err = registry
        .save(&session_id, save_params, None)
        .expect("dispatch save")
        .error
        .expect("save conflicts");
    assert_eq!(err.code, ErrorCode::Conflict);
    let remediation = err.details["remediation"].as_array().expect("remediation list");
    let remediation: Vec<&str> = remediation.iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(remediation, vec!["reload", "overwrite", "merge_hook"]);

    let on_disk = std::fs::read_to_string(&doc_path).expect("read back");
    assert_eq!(on_disk, external_content);
}
