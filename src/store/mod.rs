//! store
//!
//! The object/reference store consumed by the commit pipeline.
//!
//! # Architecture
//!
//! [`ObjectStore`] is the only seam between the commit orchestrator and the
//! database that hashes, encodes and persists objects. The orchestrator never
//! sees how ids are computed or how references are updated; it only sequences
//! calls and owns the handles they return.
//!
//! Handles are associated types. Implementations release the underlying
//! resource when a handle is dropped, so scoped ownership in the caller is
//! all it takes to guarantee release on every exit path.
//!
//! # Implementations
//!
//! - [`git::GitStore`] - libgit2-backed store (the only module importing `git2`)
//! - [`mock::MockStore`] - In-memory store that records handle lifetimes and
//!   injects failures, for deterministic tests
//!
//! # Invariants
//!
//! - `create_commit` is the only mutating call; the store must make the
//!   reference update atomic (compare-and-swap against the first parent)
//! - Every returned id is a valid [`Oid`]

pub mod git;
pub mod mock;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::commit::record::CommitRecord;
use crate::core::signature::{Identity, SignatureSpec};
use crate::core::status::{StatusEntry, StatusScope};
use crate::core::types::{Oid, RefName, TypeError};

/// Numeric codes carried by [`StoreError`], aligned with libgit2's.
pub mod codes {
    pub const GENERIC: i32 = -1;
    pub const NOT_FOUND: i32 = -3;
    pub const INVALID_SPEC: i32 = -12;
    pub const LOCKED: i32 = -14;
    pub const MODIFIED: i32 = -15;
}

/// Errors from store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No repository at the given path.
    #[error("not a repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// The repository handle can no longer be used.
    #[error("repository unavailable: {message}")]
    Unavailable {
        /// Why the handle is unusable
        message: String,
    },

    /// Object not found in the store.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The id that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid id string
        oid: String,
    },

    /// The reference moved since the caller read it.
    #[error("reference {refname} was modified concurrently: {message}")]
    RefModified {
        /// The reference being updated
        refname: String,
        /// Store detail
        message: String,
    },

    /// The store is locked by another writer.
    #[error("store is locked: {message}")]
    Locked {
        /// Store detail
        message: String,
    },

    /// Any other store failure.
    #[error("store error {code}: {message}")]
    Internal {
        /// Store-specific error code
        code: i32,
        /// The error message
        message: String,
    },
}

impl StoreError {
    /// Numeric error code, libgit2-style (negative).
    pub fn code(&self) -> i32 {
        match self {
            StoreError::NotARepo { .. } | StoreError::ObjectNotFound { .. } => codes::NOT_FOUND,
            StoreError::Unavailable { .. } => codes::GENERIC,
            StoreError::InvalidOid { .. } => codes::INVALID_SPEC,
            StoreError::RefModified { .. } => codes::MODIFIED,
            StoreError::Locked { .. } => codes::LOCKED,
            StoreError::Internal { code, .. } => *code,
        }
    }

    /// Shorthand for a generic failure.
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal {
            code: codes::GENERIC,
            message: message.into(),
        }
    }
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => StoreError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => StoreError::Internal {
                code: codes::INVALID_SPEC,
                message: msg,
            },
        }
    }
}

/// Fields the store needs to create a commit.
///
/// Parent order is preserved as given; it defines the edge order of the
/// history graph.
pub struct NewCommit<'a, 's, S: ObjectStore + ?Sized + 's> {
    pub update_ref: &'a RefName,
    pub author: &'a S::Signature,
    pub committer: &'a S::Signature,
    pub message: &'a str,
    pub tree: &'a S::Tree<'s>,
    pub parents: &'a [S::Commit<'s>],
}

/// The object/reference store contract.
///
/// # Example
///
/// ```
/// use commitwork::store::ObjectStore;
/// use commitwork::store::mock::MockStore;
/// use commitwork::core::status::StatusScope;
///
/// let store = MockStore::new();
/// store.stage_file("README.md", b"hello");
///
/// let statuses = store.status(StatusScope::IndexOnly).unwrap();
/// assert_eq!(statuses.len(), 1);
/// ```
pub trait ObjectStore {
    /// Canonical signature handle.
    type Signature;

    /// Open staging-area handle.
    type Index<'s>
    where
        Self: 's;

    /// Tree object handle.
    type Tree<'s>
    where
        Self: 's;

    /// Commit object handle.
    type Commit<'s>
    where
        Self: 's;

    /// Path of the repository behind this store.
    ///
    /// Fails if the handle has been closed or is otherwise unusable.
    fn location(&self) -> Result<&Path, StoreError>;

    /// The identity configured in the store, if any.
    fn default_identity(&self) -> Result<Option<Identity>, StoreError>;

    /// Build a canonical signature from validated caller fields.
    fn create_signature(&self, spec: &SignatureSpec) -> Result<Self::Signature, StoreError>;

    /// Ordered status entries for the requested scope.
    fn status(&self, scope: StatusScope) -> Result<Vec<StatusEntry>, StoreError>;

    /// Open the repository's staging area.
    fn open_index(&self) -> Result<Self::Index<'_>, StoreError>;

    /// Number of entries in the staging area.
    fn index_entry_count(&self, index: &Self::Index<'_>) -> usize;

    /// Write the staging area into a tree object and return its id.
    fn write_tree(&self, index: &mut Self::Index<'_>) -> Result<Oid, StoreError>;

    /// Look up a tree by id.
    fn lookup_tree(&self, id: &Oid) -> Result<Self::Tree<'_>, StoreError>;

    /// Look up a commit by id.
    fn lookup_commit(&self, id: &Oid) -> Result<Self::Commit<'_>, StoreError>;

    /// Id of the tree a commit points to.
    fn commit_tree_id(&self, commit: &Self::Commit<'_>) -> Oid;

    /// Canonical record of a commit.
    fn commit_record(&self, commit: &Self::Commit<'_>) -> Result<CommitRecord, StoreError>;

    /// Create a commit, advance `update_ref` to it, and return its id.
    fn create_commit<'s>(&'s self, commit: NewCommit<'_, 's, Self>) -> Result<Oid, StoreError>;
}
