use super::*;

#[test]
fn fallback_without_last_good_escapes_body_as_pre() {
    let preview = synthesize_fallback(None, "<script>alert(1)</script>");
    assert_eq!(
        preview.html,
        "<pre>&lt;script&gt;alert(1)&lt;/script&gt;</pre>"
    );
    assert!(preview.metadata.fallback);
    assert_eq!(preview.metadata.adapter, "fallback");
}

#[test]
fn fallback_with_last_good_reuses_it_with_diagnostic() {
    let preview = synthesize_fallback(Some("<p>old</p>"), "# New\n");
    assert!(preview.html.contains("<p>old</p>"));
    assert!(preview.html.contains("fallback"));
    assert!(preview.metadata.fallback);
}
