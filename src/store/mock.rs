//! store::mock
//!
//! In-memory object store for deterministic testing.
//!
//! # Design
//!
//! `MockStore` implements [`ObjectStore`] over plain maps. Every handle it
//! hands out carries a guard that reports back to a shared ledger when it is
//! dropped, so tests can assert that a commit attempt released everything it
//! acquired, on success and on every failure path.
//!
//! It also records each store call in order and can be told to fail a given
//! call (every time, or only its n-th invocation).
//!
//! Object ids are the first 20 bytes of a SHA-256 over a canonical encoding
//! of the object, so identical content always yields identical ids.
//!
//! Reference updates follow libgit2: when the updated reference already
//! points at a commit, the first parent of the new commit must be that
//! commit, otherwise the update fails with [`StoreError::RefModified`].
//!
//! # Example
//!
//! ```
//! use commitwork::store::mock::{HandleKind, MockStore};
//! use commitwork::store::ObjectStore;
//!
//! let store = MockStore::new();
//! store.stage_file("README.md", b"# hello\n");
//!
//! {
//!     let index = store.open_index().unwrap();
//!     assert_eq!(store.index_entry_count(&index), 1);
//!     assert_eq!(store.live_handles(), 1);
//! }
//!
//! assert_eq!(store.live_handles(), 0);
//! assert_eq!(store.handle_stats(HandleKind::Index).released, 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};

use crate::commit::record::{summarize, CommitRecord};
use crate::core::signature::{Identity, Signature, SignatureSpec, SignatureTime};
use crate::core::status::{StatusEntry, StatusFlags, StatusScope};
use crate::core::types::{Oid, RefName};

use super::{NewCommit, ObjectStore, StoreError};

/// A store call, as recorded by [`MockStore::calls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Location,
    DefaultIdentity,
    CreateSignature,
    Status,
    OpenIndex,
    IndexEntryCount,
    WriteTree,
    LookupTree,
    LookupCommit,
    CommitRecord,
    CreateCommit,
}

/// Kinds of handle tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandleKind {
    Signature,
    Index,
    Tree,
    Commit,
}

/// Acquisition/release counts for one handle kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub acquired: usize,
    pub released: usize,
}

impl HandleStats {
    /// Handles of this kind still alive.
    pub fn live(&self) -> usize {
        self.acquired - self.released
    }
}

/// An injected failure.
#[derive(Debug, Clone)]
struct FailOn {
    op: StoreOp,
    /// 1-based invocation to fail; `None` fails every invocation.
    nth: Option<usize>,
    error: StoreError,
}

/// Mock object store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
    path: PathBuf,
}

#[derive(Debug)]
struct MockStoreInner {
    closed: bool,
    identity: Option<Identity>,
    /// Branch `HEAD` points at.
    head_target: String,
    refs: BTreeMap<String, Oid>,
    /// Staged path -> blob id.
    index: BTreeMap<String, Oid>,
    status_override: Option<Vec<StatusEntry>>,
    trees: HashMap<Oid, BTreeMap<String, Oid>>,
    commits: HashMap<Oid, CommitRecord>,
    calls: Vec<StoreOp>,
    failures: Vec<FailOn>,
    handles: BTreeMap<HandleKind, HandleStats>,
}

/// Reports a handle release to the ledger when dropped.
#[derive(Debug)]
struct HandleGuard {
    kind: HandleKind,
    inner: Arc<Mutex<MockStoreInner>>,
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        // Never panic here: a guard may drop while a failed test unwinds.
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.handles.entry(self.kind).or_default().released += 1;
    }
}

/// Signature handle.
#[derive(Debug)]
pub struct MockSignature {
    signature: Signature,
    _guard: HandleGuard,
}

impl MockSignature {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Staging-area handle (a snapshot taken at open time).
#[derive(Debug)]
pub struct MockIndex {
    entries: BTreeMap<String, Oid>,
    _guard: HandleGuard,
}

/// Tree handle.
#[derive(Debug)]
pub struct MockTree {
    id: Oid,
    _guard: HandleGuard,
}

/// Commit handle.
#[derive(Debug)]
pub struct MockCommit {
    id: Oid,
    _guard: HandleGuard,
}

impl MockTree {
    pub fn id(&self) -> &Oid {
        &self.id
    }
}

impl MockCommit {
    pub fn id(&self) -> &Oid {
        &self.id
    }
}

fn hash_object(kind: &str, body: &[u8]) -> Oid {
    let mut hasher = Sha256::new();
    hasher.update(format!("{} {}\0", kind, body.len()).as_bytes());
    hasher.update(body);
    let digest = hasher.finalize();

    let mut raw = [0u8; Oid::RAW_LEN];
    raw.copy_from_slice(&digest[..Oid::RAW_LEN]);
    Oid::from_bytes(raw)
}

fn encode_tree(entries: &BTreeMap<String, Oid>) -> Vec<u8> {
    let mut body = Vec::new();
    for (path, blob) in entries {
        body.extend_from_slice(path.as_bytes());
        body.push(0);
        body.extend_from_slice(&blob.to_bytes());
    }
    body
}

fn encode_commit(
    tree: &Oid,
    parents: &[Oid],
    author: &Signature,
    committer: &Signature,
    message: &str,
) -> Vec<u8> {
    let mut body = format!("tree {}\n", tree);
    for parent in parents {
        body.push_str(&format!("parent {}\n", parent));
    }
    body.push_str(&format!("author {}\n", author));
    body.push_str(&format!("committer {}\n", committer));
    body.push('\n');
    body.push_str(message);
    body.into_bytes()
}

impl MockStoreInner {
    fn resolve(&self, refname: &str) -> Option<&Oid> {
        if refname == "HEAD" {
            self.refs.get(&self.head_target)
        } else {
            self.refs.get(refname)
        }
    }

    fn ref_key(&self, refname: &str) -> String {
        if refname == "HEAD" {
            self.head_target.clone()
        } else {
            refname.to_string()
        }
    }

    fn head_tree(&self) -> BTreeMap<String, Oid> {
        self.resolve("HEAD")
            .and_then(|id| self.commits.get(id))
            .and_then(|commit| self.trees.get(&commit.tree_id))
            .cloned()
            .unwrap_or_default()
    }

    fn staged_status(&self) -> Vec<StatusEntry> {
        let head = self.head_tree();
        let mut entries = Vec::new();

        for (path, blob) in &self.index {
            let flags = match head.get(path) {
                None => StatusFlags::new_file(),
                Some(old) if old != blob => StatusFlags::modified(),
                Some(_) => continue,
            };
            entries.push(StatusEntry::new(path.clone(), flags));
        }
        for path in head.keys() {
            if !self.index.contains_key(path) {
                entries.push(StatusEntry::new(path.clone(), StatusFlags::deleted()));
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    fn insert_tree(&mut self, entries: BTreeMap<String, Oid>) -> Oid {
        let id = hash_object("tree", &encode_tree(&entries));
        self.trees.entry(id.clone()).or_insert(entries);
        id
    }

    fn insert_commit(
        &mut self,
        tree_id: Oid,
        parent_ids: Vec<Oid>,
        author: Signature,
        committer: Signature,
        message: &str,
    ) -> Oid {
        let id = hash_object(
            "commit",
            &encode_commit(&tree_id, &parent_ids, &author, &committer, message),
        );
        self.commits.insert(
            id.clone(),
            CommitRecord {
                id: id.clone(),
                tree_id,
                parent_ids,
                author,
                committer,
                summary: summarize(message),
                message: message.to_string(),
            },
        );
        id
    }
}

impl MockStore {
    /// Create an empty store with an unborn `HEAD` on `refs/heads/main`.
    pub fn new() -> Self {
        Self::with_path("/mock/repo/.git")
    }

    /// Create an empty store reporting the given repository path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockStoreInner {
                closed: false,
                identity: None,
                head_target: "refs/heads/main".to_string(),
                refs: BTreeMap::new(),
                index: BTreeMap::new(),
                status_override: None,
                trees: HashMap::new(),
                commits: HashMap::new(),
                calls: Vec::new(),
                failures: Vec::new(),
                handles: BTreeMap::new(),
            })),
            path: path.into(),
        }
    }

    /// Fail every invocation of `op` with `error`.
    pub fn fail_on(self, op: StoreOp, error: StoreError) -> Self {
        self.inner.lock().unwrap().failures.push(FailOn {
            op,
            nth: None,
            error,
        });
        self
    }

    /// Fail only the `nth` (1-based) invocation of `op` with `error`.
    pub fn fail_on_nth(self, op: StoreOp, nth: usize, error: StoreError) -> Self {
        self.inner.lock().unwrap().failures.push(FailOn {
            op,
            nth: Some(nth),
            error,
        });
        self
    }

    /// Clear injected failures.
    pub fn clear_failures(&self) {
        self.inner.lock().unwrap().failures.clear();
    }

    /// Mark the repository handle closed; every call then fails.
    pub fn close(&self) {
        self.inner.lock().unwrap().closed = true;
    }

    /// Set the identity reported by `default_identity`.
    pub fn set_identity(&self, identity: Identity) {
        self.inner.lock().unwrap().identity = Some(identity);
    }

    /// Stage a file with the given content.
    pub fn stage_file(&self, path: &str, content: &[u8]) -> Oid {
        let blob = hash_object("blob", content);
        self.inner
            .lock()
            .unwrap()
            .index
            .insert(path.to_string(), blob.clone());
        blob
    }

    /// Remove a path from the staging area.
    pub fn unstage(&self, path: &str) {
        self.inner.lock().unwrap().index.remove(path);
    }

    /// Empty the staging area.
    pub fn clear_index(&self) {
        self.inner.lock().unwrap().index.clear();
    }

    /// Report these entries from `status` instead of the computed diff.
    pub fn set_statuses(&self, entries: Vec<StatusEntry>) {
        self.inner.lock().unwrap().status_override = Some(entries);
    }

    /// Commit the current index on top of `HEAD`, like `git commit`.
    ///
    /// Bypasses call recording, failure injection and the handle ledger.
    pub fn commit_index(&self, message: &str) -> Oid {
        let mut inner = self.inner.lock().unwrap();
        let entries = inner.index.clone();
        let tree_id = inner.insert_tree(entries);
        let parents: Vec<Oid> = inner.resolve("HEAD").cloned().into_iter().collect();
        let id = inner.insert_commit(
            tree_id,
            parents,
            fixture_signature(),
            fixture_signature(),
            message,
        );
        let key = inner.ref_key("HEAD");
        inner.refs.insert(key, id.clone());
        id
    }

    /// Create a commit with explicit parents without moving any reference.
    pub fn seed_commit(&self, message: &str, parents: &[Oid]) -> Oid {
        let mut inner = self.inner.lock().unwrap();
        let entries = inner.index.clone();
        let tree_id = inner.insert_tree(entries);
        inner.insert_commit(
            tree_id,
            parents.to_vec(),
            fixture_signature(),
            fixture_signature(),
            message,
        )
    }

    /// Point a reference at a commit.
    pub fn set_ref(&self, refname: &str, id: &Oid) {
        let mut inner = self.inner.lock().unwrap();
        let key = inner.ref_key(refname);
        inner.refs.insert(key, id.clone());
    }

    /// Current target of a reference (`HEAD` is followed).
    pub fn resolve_ref(&self, refname: &str) -> Option<Oid> {
        self.inner.lock().unwrap().resolve(refname).cloned()
    }

    /// Stored commit by id (for test verification).
    pub fn get_commit(&self, id: &Oid) -> Option<CommitRecord> {
        self.inner.lock().unwrap().commits.get(id).cloned()
    }

    /// Number of stored commits.
    pub fn commit_count(&self) -> usize {
        self.inner.lock().unwrap().commits.len()
    }

    /// All recorded store calls, in order.
    pub fn calls(&self) -> Vec<StoreOp> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// How many times `op` was called.
    pub fn call_count(&self, op: StoreOp) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    /// Ledger entry for one handle kind.
    pub fn handle_stats(&self, kind: HandleKind) -> HandleStats {
        self.inner
            .lock()
            .unwrap()
            .handles
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    /// Total handles acquired and not yet released.
    pub fn live_handles(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .handles
            .values()
            .map(HandleStats::live)
            .sum()
    }

    /// Record a call and apply any injected failure.
    fn begin(&self, op: StoreOp) -> Result<MutexGuard<'_, MockStoreInner>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(op);

        if inner.closed {
            return Err(StoreError::Unavailable {
                message: "repository handle is closed".to_string(),
            });
        }

        let count = inner.calls.iter().filter(|c| **c == op).count();
        let failure = inner
            .failures
            .iter()
            .find(|f| f.op == op && f.nth.map_or(true, |n| n == count));
        if let Some(failure) = failure {
            return Err(failure.error.clone());
        }

        Ok(inner)
    }

    /// Register a new handle. Must be the last fallible-free step of a call.
    fn guard(&self, inner: &mut MockStoreInner, kind: HandleKind) -> HandleGuard {
        inner.handles.entry(kind).or_default().acquired += 1;
        HandleGuard {
            kind,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

fn fixture_signature() -> Signature {
    Signature {
        name: "Fixture".to_string(),
        email: "fixture@example.com".to_string(),
        when: SignatureTime::new(1_600_000_000, 0),
    }
}

impl ObjectStore for MockStore {
    type Signature = MockSignature;
    type Index<'s>
        = MockIndex
    where
        Self: 's;
    type Tree<'s>
        = MockTree
    where
        Self: 's;
    type Commit<'s>
        = MockCommit
    where
        Self: 's;

    fn location(&self) -> Result<&Path, StoreError> {
        let _inner = self.begin(StoreOp::Location)?;
        Ok(&self.path)
    }

    fn default_identity(&self) -> Result<Option<Identity>, StoreError> {
        let inner = self.begin(StoreOp::DefaultIdentity)?;
        Ok(inner.identity.clone())
    }

    fn create_signature(&self, spec: &SignatureSpec) -> Result<Self::Signature, StoreError> {
        let mut inner = self.begin(StoreOp::CreateSignature)?;

        let name = spec.name().trim();
        let email = spec.email().trim();
        if [name, email].iter().any(|s| s.contains('<') || s.contains('>')) {
            return Err(StoreError::internal(
                "failed to parse signature - signature cannot contain angle brackets",
            ));
        }

        let signature = Signature {
            name: name.to_string(),
            email: email.to_string(),
            when: spec.when(),
        };
        let guard = self.guard(&mut inner, HandleKind::Signature);
        Ok(MockSignature {
            signature,
            _guard: guard,
        })
    }

    fn status(&self, scope: StatusScope) -> Result<Vec<StatusEntry>, StoreError> {
        let inner = self.begin(StoreOp::Status)?;
        if let Some(entries) = &inner.status_override {
            return Ok(entries.clone());
        }
        match scope {
            StatusScope::IndexOnly => Ok(inner.staged_status()),
        }
    }

    fn open_index(&self) -> Result<Self::Index<'_>, StoreError> {
        let mut inner = self.begin(StoreOp::OpenIndex)?;
        let entries = inner.index.clone();
        let guard = self.guard(&mut inner, HandleKind::Index);
        Ok(MockIndex {
            entries,
            _guard: guard,
        })
    }

    fn index_entry_count(&self, index: &Self::Index<'_>) -> usize {
        self.inner.lock().unwrap().calls.push(StoreOp::IndexEntryCount);
        index.entries.len()
    }

    fn write_tree(&self, index: &mut Self::Index<'_>) -> Result<Oid, StoreError> {
        let mut inner = self.begin(StoreOp::WriteTree)?;
        Ok(inner.insert_tree(index.entries.clone()))
    }

    fn lookup_tree(&self, id: &Oid) -> Result<Self::Tree<'_>, StoreError> {
        let mut inner = self.begin(StoreOp::LookupTree)?;
        if !inner.trees.contains_key(id) {
            return Err(StoreError::ObjectNotFound {
                oid: id.to_string(),
            });
        }
        let guard = self.guard(&mut inner, HandleKind::Tree);
        Ok(MockTree {
            id: id.clone(),
            _guard: guard,
        })
    }

    fn lookup_commit(&self, id: &Oid) -> Result<Self::Commit<'_>, StoreError> {
        let mut inner = self.begin(StoreOp::LookupCommit)?;
        if !inner.commits.contains_key(id) {
            return Err(StoreError::ObjectNotFound {
                oid: id.to_string(),
            });
        }
        let guard = self.guard(&mut inner, HandleKind::Commit);
        Ok(MockCommit {
            id: id.clone(),
            _guard: guard,
        })
    }

    fn commit_tree_id(&self, commit: &Self::Commit<'_>) -> Oid {
        self.inner
            .lock()
            .unwrap()
            .commits
            .get(&commit.id)
            .map(|c| c.tree_id.clone())
            .unwrap_or_else(Oid::zero)
    }

    fn commit_record(&self, commit: &Self::Commit<'_>) -> Result<CommitRecord, StoreError> {
        let inner = self.begin(StoreOp::CommitRecord)?;
        inner
            .commits
            .get(&commit.id)
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound {
                oid: commit.id.to_string(),
            })
    }

    fn create_commit<'s>(&'s self, commit: NewCommit<'_, 's, Self>) -> Result<Oid, StoreError> {
        let mut inner = self.begin(StoreOp::CreateCommit)?;

        let refname: &RefName = commit.update_ref;
        let parent_ids: Vec<Oid> = commit.parents.iter().map(|p| p.id.clone()).collect();

        if let Some(current) = inner.resolve(refname.as_str()) {
            if parent_ids.first() != Some(current) {
                return Err(StoreError::RefModified {
                    refname: refname.to_string(),
                    message: "failed to create commit: current tip is not the first parent"
                        .to_string(),
                });
            }
        }

        let id = inner.insert_commit(
            commit.tree.id.clone(),
            parent_ids,
            commit.author.signature.clone(),
            commit.committer.signature.clone(),
            commit.message,
        );
        let key = inner.ref_key(refname.as_str());
        inner.refs.insert(key, id.clone());
        Ok(id)
    }
}
