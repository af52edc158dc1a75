use super::*;
use std::fs;

#[test]
fn capture_reports_size_and_hash() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("doc.md");
    fs::write(&path, b"hello world").expect("write");

    let snap = DiskSnapshot::capture(&path).expect("capture");
    assert_eq!(snap.size, 11);
    assert_eq!(snap.sha256, hex_sha256(b"hello world"));
    assert_eq!(snap.path, path);
}

#[test]
fn capture_of_equal_mtime_and_size_has_equal_hash() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("doc.md");
    fs::write(&path, b"same bytes").expect("write");

    let a = DiskSnapshot::capture(&path).expect("capture a");
    let b = DiskSnapshot::capture(&path).expect("capture b");
    assert_eq!(a.mtime_ms, b.mtime_ms);
    assert_eq!(a.size, b.size);
    assert_eq!(a.sha256, b.sha256);
}

#[test]
fn capture_missing_file_is_filesystem_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.md");
    let err = DiskSnapshot::capture(&missing).unwrap_err();
    assert_eq!(err.code, jido_core::ErrorCode::FilesystemError);
}
