use super::*;
use std::fs;

#[test]
fn resolves_relative_path_against_workspace_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolved = resolve_path(Path::new("notes.md"), dir.path()).expect("resolve");
    assert_eq!(resolved, dir.path().join("notes.md"));
}

#[test]
fn accepts_nonexistent_tail_segment_for_new_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolved = resolve_path(Path::new("new/nested.md"), dir.path()).expect("resolve");
    assert_eq!(resolved, dir.path().join("new/nested.md"));
}

#[test]
fn rejects_path_escaping_workspace_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = resolve_path(Path::new("../../etc/passwd"), dir.path()).unwrap_err();
    assert_eq!(
        err.details.get("policy").and_then(|v| v.as_str()),
        Some("workspace_boundary")
    );
}

#[test]
#[cfg(unix)]
fn follows_symlink_inside_workspace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target_dir = dir.path().join("real");
    fs::create_dir(&target_dir).expect("mkdir");
    let link = dir.path().join("linked");
    std::os::unix::fs::symlink(&target_dir, &link).expect("symlink");

    let resolved = resolve_path(Path::new("linked/file.md"), dir.path()).expect("resolve");
    assert_eq!(resolved, target_dir.join("file.md"));
}

#[test]
#[cfg(unix)]
fn rejects_symlink_escaping_workspace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outside = tempfile::tempdir().expect("tempdir");
    let link = dir.path().join("escape");
    std::os::unix::fs::symlink(outside.path(), &link).expect("symlink");

    let err = resolve_path(Path::new("escape/file.md"), dir.path()).unwrap_err();
    assert_eq!(
        err.details.get("policy").and_then(|v| v.as_str()),
        Some("workspace_boundary")
    );
}
