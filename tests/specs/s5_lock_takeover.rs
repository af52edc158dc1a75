//! S5 — lock takeover (spec §8).

use crate::prelude::registry_at;
use jido_core::ErrorCode;

#[test]
fn force_takeover_overrides_a_held_lock_and_signals_both_changes() {
    let workspace = tempfile::tempdir().expect("workspace");
    let (registry, _clock, _checkpoints) = registry_at(workspace.path());
    let session_id = registry
        .ensure_session_by_path(std::path::Path::new("doc.md"), Default::default())
        .expect("ensure session");
    let (_subscriber, mut signals) = registry.subscribe(&session_id).expect("subscribe");

    registry
        .acquire_lock(&session_id, "A", None, false, None)
        .expect("A acquires");

    let err = registry
        .acquire_lock(&session_id, "B", None, false, None)
        .expect_err("B is refused");
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(err.details["owner"], "A");

    let takeover = registry
        .force_takeover(&session_id, "B", Some("admin override"), None)
        .expect("B takes over");
    assert_eq!(takeover.owner, "B");
    assert_eq!(takeover.previous_owner, Some("A".to_string()));

    let mut lock_state_signals = Vec::new();
    while let Ok(signal) = signals.try_recv() {
        if signal.type_ == jido_signals::SignalType::Updated
            && signal.data["action"] == "lock_state"
        {
            lock_state_signals.push(signal.data["payload"].clone());
        }
    }
    assert_eq!(lock_state_signals.len(), 2);
    assert_eq!(lock_state_signals[0]["action"], "granted");
    assert_eq!(lock_state_signals[1]["action"], "takeover");
}
