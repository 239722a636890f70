//! Shared helpers for unit tests.

use std::path::PathBuf;
use tempfile::TempDir;

/// An empty notes directory that is removed when dropped
pub fn create_test_notes_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp notes dir")
}

/// Write `content` to `name` inside the notes directory and return its path
pub fn create_test_file(notes_dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = notes_dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}
