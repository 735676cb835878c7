#![allow(dead_code)]

use reshape_core::{ArchiveSession, DirectoryEntry, Settings, Structure};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Helper function to initialize the tracing subscriber for tests.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Writes `content` at `relative` under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A small project: a tracked directory with nesting, root files, a VCS
/// directory, a descriptor and some hidden entries.
pub fn setup_project() -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();

    write_file(root, "src/a.txt", "alpha");
    write_file(root, "src/lib.rs", "pub fn lib() {}");
    write_file(root, "src/sub/deep.txt", "deep");
    write_file(root, "src/sub/inner/deeper.txt", "deeper");
    write_file(root, "docs/guide.md", "# Guide");
    write_file(root, "README.md", "# Readme");
    write_file(root, "notes.txt", "notes");
    write_file(root, ".git/HEAD", "ref: refs/heads/main");
    write_file(root, ".env", "SECRET=1");
    write_file(root, "src/.cache/blob", "cached");
    write_file(root, "layout.map", "{}");

    temp_dir
}

/// `src` with `a.txt` and an empty `sub`, plus `README.md` at the root.
pub fn sample_structure() -> Structure {
    let mut structure = Structure::default();
    structure.directories.insert(
        "src".to_string(),
        DirectoryEntry {
            files: vec!["a.txt".to_string()],
            dirs: vec!["sub".to_string()],
        },
    );
    structure.root_files.push("README.md".to_string());
    structure
}

pub fn fixed_session(settings: &Settings) -> ArchiveSession {
    ArchiveSession::with_timestamp(settings, "20240101_120000")
}
