//! Integration tests for the git-backed store.
//!
//! These tests use real git repositories created via tempfile to verify
//! that commit creation works end to end against libgit2.

use std::path::Path;

use tempfile::TempDir;

use commitwork::commit::{
    commit_tree, create_commit, default_signature_at, CommitError, CommitOptions, CommitRequest,
    ParentList,
};
use commitwork::commit::record::summarize;
use commitwork::core::signature::{SignatureSpec, SignatureTime};
use commitwork::core::types::RefName;
use commitwork::store::git::GitStore;
use commitwork::store::{codes, ObjectStore, StoreError};

/// Test fixture wrapping a real, non-bare git repository.
struct TestRepo {
    dir: TempDir,
    repo: git2::Repository,
}

impl TestRepo {
    /// Create an empty repository with an unborn HEAD.
    fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = git2::Repository::init(dir.path()).expect("failed to init repo");
        {
            let mut config = repo.config().expect("failed to open config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        Self { dir, repo }
    }

    /// Create a repository with one commit on HEAD.
    fn new() -> Self {
        let repo = Self::empty();
        repo.stage("README.md", "# Test Repo\n");
        repo.commit_staged("Initial commit");
        repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open a store on this repository.
    ///
    /// Open after staging: a store reads the index from disk when opened.
    fn store(&self) -> GitStore {
        GitStore::open(self.path()).expect("failed to open test repo")
    }

    /// Write a file and add it to the index.
    fn stage(&self, path: &str, content: &str) {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
    }

    /// Commit the index on top of HEAD, like `git commit`.
    fn commit_staged(&self, message: &str) -> git2::Oid {
        let mut index = self.repo.index().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = self.repo.signature().unwrap();
        let parents: Vec<git2::Commit<'_>> = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    /// Create a commit off HEAD without moving any reference.
    fn side_commit(&self, message: &str) -> git2::Oid {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        let tree = head.tree().unwrap();
        let sig = self.repo.signature().unwrap();
        self.repo
            .commit(None, &sig, &sig, message, &tree, &[&head])
            .unwrap()
    }

    /// Current HEAD id as hex, if HEAD is born.
    fn head(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| oid.to_string())
    }
}

fn who(name: &str) -> SignatureSpec {
    SignatureSpec::new(
        name,
        format!("{}@example.com", name.to_lowercase()),
        SignatureTime::new(1_700_000_000, 120),
    )
    .unwrap()
}

fn request(message: &str, parents: ParentList) -> CommitRequest {
    CommitRequest::new(message, who("Ada"), who("Bob"), parents)
}

// =============================================================================
// Opening
// =============================================================================

#[test]
fn open_from_subdirectory() {
    let repo = TestRepo::new();
    let subdir = repo.path().join("nested/dir");
    std::fs::create_dir_all(&subdir).unwrap();

    let store = GitStore::open(&subdir).unwrap();
    assert!(store.git_dir().ends_with(".git"));
}

#[test]
fn open_non_repository_fails() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        GitStore::open(dir.path()),
        Err(StoreError::NotARepo { .. })
    ));
}

#[test]
fn bare_repository_is_unavailable() {
    let dir = TempDir::new().unwrap();
    git2::Repository::init_bare(dir.path()).unwrap();
    assert!(matches!(
        GitStore::open(dir.path()),
        Err(StoreError::Unavailable { .. })
    ));
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn root_commit_in_fresh_repository() {
    let repo = TestRepo::empty();
    repo.stage("hello.txt", "hello\n");
    let expected_tree = repo.repo.index().unwrap().write_tree().unwrap().to_string();
    let store = repo.store();

    let outcome = create_commit(
        &store,
        &request("Initial commit", ParentList::root()),
        &CommitOptions::default(),
    )
    .unwrap();

    assert!(outcome.commit.is_root());
    assert_eq!(outcome.tree.id.as_str(), expected_tree);
    assert_eq!(outcome.commit.tree_id, outcome.tree.id);
    assert_eq!(repo.head().as_deref(), Some(outcome.commit.id.as_str()));

    // Use canonicalize to handle macOS /var -> /private/var symlink
    assert_eq!(
        outcome.repo_path.canonicalize().unwrap(),
        repo.path().join(".git").canonicalize().unwrap()
    );
}

#[test]
fn unknown_parent_leaves_head_unchanged() {
    let repo = TestRepo::new();
    repo.stage("a.txt", "a\n");
    let before = repo.head();
    let store = repo.store();

    let err = create_commit(
        &store,
        &request("Initial commit", ParentList::new(["deadbeef".repeat(5)])),
        &CommitOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, CommitError::UnknownParent { position: 0, .. }));
    assert_eq!(repo.head(), before);
}

// =============================================================================
// Empty commits
// =============================================================================

#[test]
fn nothing_staged_in_fresh_repository() {
    let repo = TestRepo::empty();
    let store = repo.store();

    let err = create_commit(
        &store,
        &request("msg", ParentList::root()),
        &CommitOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, CommitError::EmptyCommit);
    assert_eq!(repo.head(), None);
}

#[test]
fn unstaged_edits_do_not_count() {
    let repo = TestRepo::new();
    std::fs::write(repo.path().join("README.md"), "# Edited\n").unwrap();
    let head = repo.head().unwrap();
    let store = repo.store();

    let err = create_commit(
        &store,
        &request("msg", ParentList::new([head.clone()])),
        &CommitOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, CommitError::EmptyCommit);
    assert_eq!(repo.head(), Some(head));
}

// =============================================================================
// Parents and references
// =============================================================================

#[test]
fn merge_commit_keeps_parent_order() {
    let repo = TestRepo::new();
    let head = repo.head().unwrap();
    let side = repo.side_commit("Side work").to_string();
    repo.stage("merged.txt", "merged\n");
    let store = repo.store();

    let outcome = create_commit(
        &store,
        &request("Merge side", ParentList::new([head.clone(), side.clone()])),
        &CommitOptions::default(),
    )
    .unwrap();

    let ids: Vec<&str> = outcome.commit.parent_ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec![head.as_str(), side.as_str()]);

    let raw = repo
        .repo
        .find_commit(git2::Oid::from_str(outcome.commit.id.as_str()).unwrap())
        .unwrap();
    assert_eq!(raw.parent_count(), 2);
    assert_eq!(raw.parent_id(0).unwrap().to_string(), head);
    assert_eq!(raw.parent_id(1).unwrap().to_string(), side);
}

#[test]
fn stale_first_parent_is_rejected() {
    let repo = TestRepo::new();
    let side = repo.side_commit("Side work").to_string();
    repo.stage("a.txt", "a\n");
    let before = repo.head();
    let store = repo.store();

    let err = create_commit(
        &store,
        &request("msg", ParentList::new([side])),
        &CommitOptions::default(),
    )
    .unwrap_err();

    match err {
        CommitError::StoreOperationFailed { code, .. } => assert_eq!(code, codes::MODIFIED),
        other => panic!("expected StoreOperationFailed, got {other:?}"),
    }
    assert_eq!(repo.head(), before);
}

#[test]
fn commit_to_new_branch() {
    let repo = TestRepo::new();
    let head = repo.head().unwrap();
    repo.stage("topic.txt", "topic\n");
    let store = repo.store();
    let options = CommitOptions {
        update_ref: RefName::for_branch("topic").unwrap(),
    };

    let outcome = create_commit(
        &store,
        &request("Topic", ParentList::new([head.clone()])),
        &options,
    )
    .unwrap();

    let topic = repo.repo.refname_to_id("refs/heads/topic").unwrap();
    assert_eq!(topic.to_string(), outcome.commit.id.as_str());
    assert_eq!(repo.head(), Some(head));
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn created_commit_round_trips() {
    let repo = TestRepo::new();
    let head = repo.head().unwrap();
    repo.stage("src/lib.rs", "pub fn f() {}\n");
    let store = repo.store();
    let message = "Add lib\n\nWith a body.\n";

    let outcome = create_commit(
        &store,
        &request(message, ParentList::new([head])),
        &CommitOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.commit.summary, "Add lib");
    assert_eq!(outcome.commit.message, message);

    let raw = repo
        .repo
        .find_commit(git2::Oid::from_str(outcome.commit.id.as_str()).unwrap())
        .unwrap();
    assert_eq!(raw.author().name(), Some("Ada"));
    assert_eq!(raw.author().email(), Some("ada@example.com"));
    assert_eq!(raw.author().when().seconds(), 1_700_000_000);
    assert_eq!(raw.author().when().offset_minutes(), 120);
    assert_eq!(raw.committer().name(), Some("Bob"));
    assert_eq!(raw.message(), Some(message));
    assert_eq!(raw.tree_id().to_string(), outcome.tree.id.as_str());

    let tree = commit_tree(&store, outcome.commit.id.as_str()).unwrap();
    assert_eq!(tree, outcome.tree);

    let commit = store.lookup_commit(&outcome.commit.id).unwrap();
    let record = store.commit_record(&commit).unwrap();
    assert_eq!(record, outcome.commit);
}

#[test]
fn commit_tree_of_unknown_commit_fails() {
    let repo = TestRepo::new();
    let store = repo.store();

    let err = commit_tree(&store, &"ab".repeat(20)).unwrap_err();
    assert!(matches!(
        err,
        CommitError::StoreOperationFailed { code: codes::NOT_FOUND, .. }
    ));
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn default_signature_uses_repository_identity() {
    let repo = TestRepo::new();
    let store = repo.store();

    let when = SignatureTime::new(1_700_000_000, 0);
    let spec = default_signature_at(&store, None, when).unwrap();

    assert_eq!(spec.name(), "Test User");
    assert_eq!(spec.email(), "test@example.com");
    assert_eq!(spec.when(), when);
}

#[test]
fn summary_matches_in_memory_rule() {
    for message in ["  lead  x\n", "Wrapped\nsubject\n\nBody\n", "a\tb  \n  c\n", " \n"] {
        let repo = TestRepo::empty();
        repo.stage("a.txt", "a\n");
        let store = repo.store();

        let outcome = create_commit(
            &store,
            &request(message, ParentList::root()),
            &CommitOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.commit.summary, summarize(message), "{message:?}");
    }
}
