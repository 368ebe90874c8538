//! commit
//!
//! Commit creation: the orchestrator and its stages.
//!
//! # Pipeline
//!
//! [`create_commit`] runs one commit attempt against a caller-owned
//! [`ObjectStore`]:
//!
//! 1. Validate the request and the store handle
//! 2. Build author and committer signatures
//! 3. Refuse to continue if nothing is staged
//! 4. Write the staging area as a tree
//! 5. Resolve every parent id to a commit handle
//! 6. Create the commit and advance the update reference
//! 7. Reload the new commit and hand back its record
//!
//! Step 6 is the only mutation. Every earlier failure leaves the store
//! untouched, and every handle acquired along the way is released when the
//! attempt ends, whatever the outcome.
//!
//! # Example
//!
//! ```
//! use commitwork::commit::{create_commit, CommitOptions, CommitRequest, ParentList};
//! use commitwork::core::signature::{SignatureSpec, SignatureTime};
//! use commitwork::store::mock::MockStore;
//!
//! let store = MockStore::new();
//! store.stage_file("README.md", b"# hello\n");
//!
//! let who = SignatureSpec::new("Dev", "dev@example.com", SignatureTime::new(1_700_000_000, 0)).unwrap();
//! let request = CommitRequest::new("Initial commit", who.clone(), who, ParentList::root());
//!
//! let outcome = create_commit(&store, &request, &CommitOptions::default()).unwrap();
//! assert!(outcome.commit.is_root());
//! assert_eq!(outcome.commit.summary, "Initial commit");
//! assert_eq!(store.live_handles(), 0);
//! ```

pub mod error;
pub mod parents;
pub mod phase;
pub mod record;
mod signatures;
mod staged;
mod tree;

pub use error::CommitError;
pub use parents::ParentList;
pub use phase::CommitPhase;
pub use record::{CommitOutcome, CommitRecord, TreeRecord};
pub use signatures::{default_signature, default_signature_at};

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, field, info, warn, Span};

use crate::core::config::Config;
use crate::core::signature::SignatureSpec;
use crate::core::types::{Oid, RefName};
use crate::store::{NewCommit, ObjectStore};

/// What to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Full commit message, stored verbatim.
    pub message: String,
    pub author: SignatureSpec,
    pub committer: SignatureSpec,
    /// Parent ids, first parent first. Empty for a root commit.
    #[serde(default)]
    pub parents: ParentList,
}

impl CommitRequest {
    pub fn new(
        message: impl Into<String>,
        author: SignatureSpec,
        committer: SignatureSpec,
        parents: ParentList,
    ) -> Self {
        Self {
            message: message.into(),
            author,
            committer,
            parents,
        }
    }

    /// Check what can be checked without a store.
    ///
    /// Signatures are validated by construction; only the message is left.
    /// Any non-empty message is accepted, whitespace included, as git does.
    pub fn validate(&self) -> Result<(), CommitError> {
        if self.message.is_empty() {
            return Err(CommitError::InvalidArgument(
                "commit message cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// How to commit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitOptions {
    /// Reference advanced to the new commit.
    pub update_ref: RefName,
}

impl CommitOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            update_ref: config.update_ref(),
        }
    }
}

/// Create a commit from the staging area and advance the update reference.
///
/// # Errors
///
/// - [`CommitError::InvalidArgument`] if the message is empty
/// - [`CommitError::RepositoryUnavailable`] if the store handle is unusable
/// - [`CommitError::EmptyCommit`] if nothing is staged
/// - [`CommitError::AllocationFailure`] if the parent buffer cannot be allocated
/// - [`CommitError::UnknownParent`] if a parent id is malformed or missing
/// - [`CommitError::StoreOperationFailed`] for any other store failure,
///   including a concurrent move of the update reference
///
/// A failure while reloading the commit after it was created is reported as
/// `StoreOperationFailed` even though the commit exists and the reference
/// was advanced.
pub fn create_commit<S>(
    store: &S,
    request: &CommitRequest,
    options: &CommitOptions,
) -> Result<CommitOutcome, CommitError>
where
    S: ObjectStore + ?Sized,
{
    let span = debug_span!(
        "commit",
        repo = field::Empty,
        update_ref = %options.update_ref,
        parents = request.parents.len()
    );
    let _enter = span.enter();

    let mut phase = CommitPhase::Uncommitted;
    let result = run(store, request, options, &mut phase);

    match &result {
        Ok(outcome) => info!(
            commit = %outcome.commit.id,
            tree = %outcome.tree.id,
            summary = %outcome.commit.summary,
            "created commit"
        ),
        Err(err) => warn!(
            phase = %phase,
            category = err.category(),
            error = %err,
            "commit failed"
        ),
    }
    result
}

fn advance(phase: &mut CommitPhase, to: CommitPhase) {
    debug_assert_eq!(phase.next(), Some(to));
    debug!(from = %phase, to = %to, "commit phase");
    *phase = to;
}

fn run<S>(
    store: &S,
    request: &CommitRequest,
    options: &CommitOptions,
    phase: &mut CommitPhase,
) -> Result<CommitOutcome, CommitError>
where
    S: ObjectStore + ?Sized,
{
    advance(phase, CommitPhase::Validating);
    request.validate()?;
    let repo_path = store
        .location()
        .map_err(|e| CommitError::RepositoryUnavailable(e.to_string()))?
        .to_path_buf();
    Span::current().record("repo", field::display(repo_path.display()));
    let sigs = signatures::build_signatures(store, &request.author, &request.committer)?;

    advance(phase, CommitPhase::Diffing);
    staged::ensure_staged_changes(store)?;

    advance(phase, CommitPhase::BuildingTree);
    let staged = tree::build_tree(store)?;

    advance(phase, CommitPhase::ResolvingParents);
    let parents = parents::resolve_parents(store, &request.parents)?;

    advance(phase, CommitPhase::Assembling);
    let id = store.create_commit(NewCommit {
        update_ref: &options.update_ref,
        author: &sigs.author,
        committer: &sigs.committer,
        message: &request.message,
        tree: &staged.tree,
        parents: &parents,
    })?;
    drop(parents);
    drop(sigs);
    debug!(commit = %id, "commit written");

    let created = store.lookup_commit(&id)?;
    let commit = store.commit_record(&created)?;
    let tree = TreeRecord { id: staged.id };

    advance(phase, CommitPhase::Committed);
    Ok(CommitOutcome {
        commit,
        tree,
        repo_path,
    })
}

/// Record of the tree a commit points to.
///
/// # Errors
///
/// - [`CommitError::InvalidArgument`] if `commit_id` is not a valid id
/// - [`CommitError::StoreOperationFailed`] if it does not name a commit
pub fn commit_tree<S>(store: &S, commit_id: &str) -> Result<TreeRecord, CommitError>
where
    S: ObjectStore + ?Sized,
{
    let id = Oid::new(commit_id)?;
    let commit = store.lookup_commit(&id)?;
    Ok(TreeRecord {
        id: store.commit_tree_id(&commit),
    })
}
