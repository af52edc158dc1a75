//! S1 — load/edit/save roundtrip (spec §8).

use crate::prelude::registry_at;
use jido_core::test_support::s1_fixture_raw;
use jido_session::{LoadParams, SaveParams, UpdateBodyParams};

#[test]
fn load_edit_save_roundtrips_and_emits_loaded_updated_saved() {
    let workspace = tempfile::tempdir().expect("workspace");
    let doc_path = workspace.path().join("doc.md");
    std::fs::write(&doc_path, s1_fixture_raw()).expect("seed fixture");

    let (registry, _clock, _checkpoints) = registry_at(workspace.path());
    let session_id = registry
        .ensure_session_by_path(std::path::Path::new("doc.md"), Default::default())
        .expect("ensure session");
    let (_subscriber, mut signals) = registry.subscribe(&session_id).expect("subscribe");

    let loaded = registry
        .load(&session_id, LoadParams { path: "doc.md".into() }, None)
        .expect("dispatch load");
    assert!(loaded.is_ok());

    registry
        .update_body(&session_id, UpdateBodyParams::full("Body1\n"), None)
        .expect("dispatch update_body");

    let saved = registry
        .save(&session_id, SaveParams::default(), None)
        .expect("dispatch save");
    assert!(saved.is_ok());
    let revision = saved.value.as_ref().expect("save value")["revision"]
        .as_u64()
        .expect("revision");
    assert_eq!(revision, 1);

    let on_disk = std::fs::read_to_string(&doc_path).expect("read back");
    assert_eq!(on_disk, "---\ntitle: \"A\"\n---\nBody1\n");

    let mut seen = Vec::new();
    while let Ok(signal) = signals.try_recv() {
        seen.push(signal.type_);
    }
    assert_eq!(
        seen,
        vec![
            jido_signals::SignalType::Loaded,
            jido_signals::SignalType::Updated,
            jido_signals::SignalType::Saved,
        ]
    );
}
