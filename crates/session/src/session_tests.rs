use super::*;
use crate::safety::{SafetyPolicy, SafetyRule, Severity};
use jido_core::test_support::session_id_for;
use jido_core::FakeClock;
use jido_render::test_support::echo_registry;
use jido_signals::SignalBus;
use std::fs;

fn test_session(workspace: &std::path::Path) -> Session<FakeClock> {
    let clock = FakeClock::new();
    let session_id = session_id_for("doc.md");
    let checkpoint_store = CheckpointStore::new(workspace.join(".checkpoints"));
    let signal_bus = Arc::new(SignalBus::new(clock.clone()));
    let config = SessionConfig {
        workspace_root: workspace.to_path_buf(),
        ..SessionConfig::default()
    };
    Session::new(session_id, config, checkpoint_store, echo_registry(), signal_bus, clock)
        .expect("session construction")
}

#[test]
fn load_of_missing_file_yields_blank_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());

    let result = session.load(LoadParams { path: PathBuf::from("new.md") }, None);
    assert!(result.is_ok());
    assert_eq!(session.document().expect("loaded").body, "");
    assert_eq!(session.document().expect("loaded").revision, 0);
}

#[test]
fn load_then_update_body_then_save_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("doc.md");
    fs::write(&target, "---\ntitle: \"A\"\n---\nBody0\n").expect("seed file");
    let mut session = test_session(dir.path());

    session.load(LoadParams { path: PathBuf::from("doc.md") }, None);
    let update = session.update_body(UpdateBodyParams::full("Body1"), None);
    assert!(update.is_ok());

    let save = session.save(SaveParams::default(), None);
    assert!(save.is_ok(), "save failed: {:?}", save.error);

    let on_disk = fs::read_to_string(&target).expect("read back");
    assert!(on_disk.contains("Body1"));
}

#[test]
fn save_with_no_path_and_no_loaded_document_is_invalid_params() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());

    let result = session.save(SaveParams::default(), None);
    assert!(!result.is_ok());
    assert_eq!(result.error.expect("error").code, jido_core::ErrorCode::InvalidParams);
}

#[test]
fn save_rejects_on_disk_divergence_by_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("doc.md");
    fs::write(&target, "---\ntitle: \"A\"\n---\nBody0\n").expect("seed file");
    let mut session = test_session(dir.path());
    session.load(LoadParams { path: PathBuf::from("doc.md") }, None);

    // Someone else writes the file after we loaded it.
    fs::write(&target, "---\ntitle: \"A\"\n---\nExternal change\n").expect("external write");

    session.update_body(UpdateBodyParams::full("Body1"), None);
    let save = session.save(SaveParams::default(), None);

    assert!(!save.is_ok());
    assert_eq!(save.error.expect("error").code, jido_core::ErrorCode::Conflict);
}

#[test]
fn save_overwrite_ignores_divergence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("doc.md");
    fs::write(&target, "---\ntitle: \"A\"\n---\nBody0\n").expect("seed file");
    let mut session = test_session(dir.path());
    session.load(LoadParams { path: PathBuf::from("doc.md") }, None);
    fs::write(&target, "---\ntitle: \"A\"\n---\nExternal change\n").expect("external write");

    session.update_body(UpdateBodyParams::full("Body1"), None);
    let save = session.save(
        SaveParams {
            on_conflict: OnConflict::Overwrite,
            ..SaveParams::default()
        },
        None,
    );

    assert!(save.is_ok(), "save failed: {:?}", save.error);
    let on_disk = fs::read_to_string(&target).expect("read back");
    assert!(on_disk.contains("Body1"));
}

#[test]
fn undo_then_redo_restores_body() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());
    session.load(LoadParams { path: PathBuf::from("new.md") }, None);

    session.update_body(UpdateBodyParams::full("first"), None);
    session.update_body(UpdateBodyParams::full("second"), None);
    assert_eq!(session.document().expect("doc").body, "second");

    let undo = session.undo(None);
    assert!(undo.is_ok());
    assert_eq!(session.document().expect("doc").body, "first");

    let redo = session.redo(None);
    assert!(redo.is_ok());
    assert_eq!(session.document().expect("doc").body, "second");
}

#[test]
fn undo_on_empty_history_is_conflict() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());
    session.load(LoadParams { path: PathBuf::from("new.md") }, None);

    let result = session.undo(None);
    assert!(!result.is_ok());
    assert_eq!(result.error.expect("error").code, jido_core::ErrorCode::Conflict);
}

#[test]
fn render_uses_registered_adapter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());
    session.load(LoadParams { path: PathBuf::from("new.md") }, None);
    session.update_body(UpdateBodyParams::full("hello"), None);

    let result = session.render(RenderParams::default(), None);
    assert!(result.is_ok());
    let value = result.value.expect("render value");
    assert_eq!(value.get("adapter").and_then(|v| v.as_str()), Some("echo"));
    assert_eq!(value.get("fallback").and_then(|v| v.as_bool()), Some(false));
    assert!(value
        .get("html")
        .and_then(|v| v.as_str())
        .expect("html")
        .contains("hello"));
}

#[test]
fn render_without_loaded_document_is_invalid_params() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());

    let result = session.render(RenderParams::default(), None);
    assert!(!result.is_ok());
    assert_eq!(result.error.expect("error").code, jido_core::ErrorCode::InvalidParams);
}

#[test]
fn checkpoint_is_recoverable_by_a_fresh_session_instance() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut session = test_session(dir.path());
        session.load(LoadParams { path: PathBuf::from("new.md") }, None);
        session.update_body(UpdateBodyParams::full("unsaved work"), None);
        session.maybe_checkpoint();
    }

    let mut recovered_session = test_session(dir.path());
    let result = recovered_session.recover(RecoverParams::default(), None);
    assert!(result.is_ok(), "recover failed: {:?}", result.error);
    assert_eq!(
        recovered_session.document().expect("recovered doc").body,
        "unsaved work"
    );
}

#[test]
fn discard_recovery_without_pending_checkpoint_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());

    let result = session.discard_recovery(None);
    assert!(!result.is_ok());
    assert_eq!(result.error.expect("error").code, jido_core::ErrorCode::NotFound);
}

#[test]
fn save_blocked_by_safety_policy_reports_validation_failed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = test_session(dir.path());
    session.load(LoadParams { path: PathBuf::from("new.md") }, None);
    session.update_body(UpdateBodyParams::full("sk-abcdefghijklmnop"), None);

    let mut block = std::collections::HashSet::new();
    block.insert(Severity::High);
    let policy = SafetyPolicy {
        rules: vec![
            SafetyRule::new("secret_key", Severity::High, r"sk-[a-zA-Z0-9]{8,}").expect("regex"),
        ],
        approved_codes: std::collections::HashSet::new(),
        block_severities: block,
    };

    let result = session.save(
        SaveParams {
            safety: Some(policy),
            ..SaveParams::default()
        },
        None,
    );
    assert!(!result.is_ok());
    assert_eq!(result.error.expect("error").code, jido_core::ErrorCode::ValidationFailed);
}
