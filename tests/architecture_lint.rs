//! Architecture enforcement tests.
//!
//! `store/git.rs` is the only doorway to libgit2, and the commit pipeline
//! talks to stores only through the `ObjectStore` trait. These tests scan
//! the source tree so violations are caught in CI.

use std::fs;
use std::path::{Path, PathBuf};

/// The one file allowed to name `git2`.
const GIT2_DOORWAY: &str = "src/store/git.rs";

fn source_files(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).expect("Failed to read source directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            source_files(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
}

fn crate_sources() -> Vec<(String, String)> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    source_files(&root.join("src"), &mut files);
    files.sort();

    files
        .into_iter()
        .map(|path| {
            let relative = path
                .strip_prefix(root)
                .expect("source outside crate")
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(&path).expect("Failed to read source file");
            (relative, content)
        })
        .collect()
}

/// Lines that are code, not comments.
fn code_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.starts_with("//"))
}

#[test]
fn only_store_git_uses_git2() {
    let mut violations = Vec::new();

    for (path, content) in crate_sources() {
        if path == GIT2_DOORWAY {
            continue;
        }
        if code_lines(&content).any(|line| line.contains("git2::")) {
            violations.push(path);
        }
    }

    assert!(
        violations.is_empty(),
        "git2 used outside {GIT2_DOORWAY}: {violations:?}"
    );
}

#[test]
fn commit_pipeline_is_store_agnostic() {
    for (path, content) in crate_sources() {
        if !path.starts_with("src/commit/") {
            continue;
        }
        for forbidden in ["store::git", "store::mock", "GitStore", "MockStore"] {
            let leaked = content
                .split("#[cfg(test)]")
                .next()
                .map(|production| code_lines(production).any(|line| line.contains(forbidden)))
                .unwrap_or(false);
            assert!(!leaked, "{path} names {forbidden} outside its tests");
        }
    }
}

#[test]
fn no_unwrap_in_commit_pipeline() {
    for (path, content) in crate_sources() {
        if !path.starts_with("src/commit/") {
            continue;
        }
        let production = content.split("#[cfg(test)]").next().unwrap_or("");
        for line in code_lines(production) {
            assert!(
                !line.contains(".unwrap()") && !line.contains(".expect("),
                "{path}: {line}"
            );
        }
    }
}

#[test]
fn doorway_exists() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    assert!(root.join(GIT2_DOORWAY).is_file());
}
