//! S6 — render fallback and recovery (spec §8).

use crate::prelude::registry_at;
use jido_render::RenderOpts;
use jido_session::{LoadParams, RenderParams, UpdateBodyParams};
use jido_signals::SignalType;

#[test]
fn unknown_adapter_falls_back_then_recovers_on_next_good_render() {
    let workspace = tempfile::tempdir().expect("workspace");
    let doc_path = workspace.path().join("doc.md");
    std::fs::write(&doc_path, "# Title\n").expect("seed");

    let (registry, _clock, _checkpoints) = registry_at(workspace.path());
    let session_id = registry
        .ensure_session_by_path(std::path::Path::new("doc.md"), Default::default())
        .expect("ensure session");
    registry
        .load(&session_id, LoadParams { path: "doc.md".into() }, None)
        .expect("dispatch load");
    registry
        .update_body(&session_id, UpdateBodyParams::full("# Title\n"), None)
        .expect("dispatch update_body");
    let (_subscriber, mut signals) = registry.subscribe(&session_id).expect("subscribe");

    let first = registry
        .render(&session_id, RenderParams::default(), None)
        .expect("dispatch first render");
    assert!(first.is_ok());
    assert_eq!(first.value.as_ref().expect("value")["fallback"], false);

    let unknown_adapter = RenderParams {
        render_opts: RenderOpts {
            adapter: Some("unknown".to_string()),
            ..RenderOpts::default()
        },
        safety: None,
    };
    let second = registry
        .render(&session_id, unknown_adapter, None)
        .expect("dispatch second render");
    assert!(second.is_ok());
    assert_eq!(second.value.as_ref().expect("value")["fallback"], true);

    let third = registry
        .render(&session_id, RenderParams::default(), None)
        .expect("dispatch third render");
    assert!(third.is_ok());
    assert_eq!(third.value.as_ref().expect("value")["fallback"], false);

    let mut saw_failed = false;
    let mut saw_rendered = 0;
    let mut saw_render_recovered = false;
    while let Ok(signal) = signals.try_recv() {
        match signal.type_ {
            SignalType::Failed => saw_failed = true,
            SignalType::Rendered => saw_rendered += 1,
            SignalType::Updated if signal.data["action"] == "render_recovered" => {
                saw_render_recovered = true;
            }
            _ => {}
        }
    }
    assert!(saw_failed, "expected a failed signal from the fallback render");
    assert!(saw_rendered >= 3);
    assert!(saw_render_recovered, "expected updated{{action: render_recovered}}");
}
