//! S4 — recovery with divergence (spec §8).

use crate::prelude::registry_with_checkpoint_dir;
use jido_core::{ErrorCode, FakeClock};
use jido_registry::SessionRegistryConfig;
use jido_session::{LoadParams, RecoverParams, RenderParams, UpdateBodyParams};

#[test]
fn crash_recovery_surfaces_divergence_then_force_recovers_in_memory_only() {
    let workspace = tempfile::tempdir().expect("workspace");
    let checkpoints = tempfile::tempdir().expect("checkpoint dir");
    let doc_path = workspace.path().join("doc.md");
    std::fs::write(&doc_path, "---\ntitle: \"A\"\n---\nBody0\n").expect("seed");

    let clock = FakeClock::new();
    let registry = registry_with_checkpoint_dir(
        workspace.path(),
        checkpoints.path(),
        SessionRegistryConfig::default(),
        clock.clone(),
    );
    let session_id = registry
        .ensure_session_by_path(std::path::Path::new("doc.md"), Default::default())
        .expect("ensure session");
    registry
        .load(&session_id, LoadParams { path: "doc.md".into() }, None)
        .expect("dispatch load");
    registry
        .update_body(&session_id, UpdateBodyParams::full("Unsaved\n"), None)
        .expect("dispatch update_body");

    // "process dies": drop the live registry without saving. The checkpoint
    // written by the edit above survives on disk under `checkpoints`.
    drop(registry);

    // Restart against the same session id and checkpoint directory.
    let clock = FakeClock::new();
    let registry = registry_with_checkpoint_dir(
        workspace.path(),
        checkpoints.path(),
        SessionRegistryConfig::default(),
        clock,
    );
    let restarted_id = registry
        .ensure_session_by_path(std::path::Path::new("doc.md"), Default::default())
        .expect("ensure session again");
    assert_eq!(restarted_id, session_id);

    std::fs::write(&doc_path, "---\ntitle: \"A\"\n---\nExternallyChanged\n").expect("external write");

    let err = registry
        .recover(&restarted_id, RecoverParams { force: false }, None)
        .expect("dispatch recover")
        .error
        .expect("recover conflicts on divergence");
    assert_eq!(err.code, ErrorCode::Conflict);
    let remediation = err.details["remediation"].as_array().expect("remediation list");
    let remediation: Vec<&str> = remediation.iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(remediation, vec!["force_recover", "discard", "reload"]);

    let forced = registry
        .recover(&restarted_id, RecoverParams { force: true }, None)
        .expect("dispatch forced recover");
    assert!(forced.is_ok());

    // The recovered body lives in memory only; disk still holds the
    // external writer's content.
    let rendered = registry
        .render(&restarted_id, RenderParams::default(), None)
        .expect("dispatch render");
    let html = rendered.value.expect("render value")["html"]
        .as_str()
        .expect("html string")
        .to_string();
    assert!(html.contains("Unsaved"));

    let on_disk = std::fs::read_to_string(&doc_path).expect("read back");
    assert_eq!(on_disk, "---\ntitle: \"A\"\n---\nExternallyChanged\n");
}
