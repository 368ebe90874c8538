//! store::git
//!
//! Object store implementation using git2.
//!
//! This module is the **only doorway** to libgit2. No other module imports
//! `git2`; everything above it sees strong types ([`Oid`], `RefName`,
//! [`StatusEntry`]) and [`StoreError`].
//!
//! # Handles
//!
//! `git2` objects free their libgit2 counterparts on drop, so they serve as
//! the handle types directly. Trees and commits borrow the repository, which
//! ties their lifetime to the store.
//!
//! # Example
//!
//! ```ignore
//! use commitwork::store::git::GitStore;
//! use std::path::Path;
//!
//! let store = GitStore::open(Path::new("."))?;
//! println!("repository at {}", store.git_dir().display());
//! ```

use std::path::Path;

use crate::commit::record::CommitRecord;
use crate::core::signature::{Identity, Signature, SignatureSpec, SignatureTime};
use crate::core::status::{StatusEntry, StatusFlags, StatusScope};
use crate::core::types::Oid;

use super::{NewCommit, ObjectStore, StoreError};

impl StoreError {
    /// Create a StoreError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => StoreError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => StoreError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => StoreError::Locked {
                message: err.message().to_string(),
            },
            git2::ErrorCode::Modified => StoreError::RefModified {
                refname: context.to_string(),
                message: err.message().to_string(),
            },
            _ => StoreError::Internal {
                code: err.raw_code(),
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

/// Convert a git2 id into a validated [`Oid`].
fn to_oid(id: git2::Oid) -> Result<Oid, StoreError> {
    let bytes: [u8; Oid::RAW_LEN] = id
        .as_bytes()
        .try_into()
        .map_err(|_| StoreError::InvalidOid { oid: id.to_string() })?;
    Ok(Oid::from_bytes(bytes))
}

fn to_git2(oid: &Oid) -> Result<git2::Oid, StoreError> {
    git2::Oid::from_bytes(&oid.to_bytes()).map_err(|e| StoreError::from_git2(e, oid.as_str()))
}

fn to_signature(sig: &git2::Signature<'_>) -> Signature {
    let when = sig.when();
    Signature {
        name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
        when: SignatureTime::new(when.seconds(), when.offset_minutes()),
    }
}

fn to_flags(status: git2::Status) -> StatusFlags {
    StatusFlags {
        index_new: status.is_index_new(),
        index_modified: status.is_index_modified(),
        index_deleted: status.is_index_deleted(),
        index_renamed: status.is_index_renamed(),
        index_typechange: status.is_index_typechange(),
        worktree_changed: status.is_wt_new()
            || status.is_wt_modified()
            || status.is_wt_deleted()
            || status.is_wt_renamed()
            || status.is_wt_typechange(),
        conflicted: status.is_conflicted(),
    }
}

/// The libgit2-backed store.
pub struct GitStore {
    repo: git2::Repository,
}

impl std::fmt::Debug for GitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitStore")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl GitStore {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotARepo`] if no repository is found
    /// - [`StoreError::Unavailable`] if the repository is bare (it has no index)
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let repo = git2::Repository::discover(path).map_err(|_| StoreError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(StoreError::Unavailable {
                message: format!("bare repository has no index: {}", repo.path().display()),
            });
        }

        Ok(Self { repo })
    }

    /// Path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Path to the working directory.
    pub fn work_dir(&self) -> Option<&Path> {
        self.repo.workdir()
    }
}

impl ObjectStore for GitStore {
    type Signature = git2::Signature<'static>;
    type Index<'s>
        = git2::Index
    where
        Self: 's;
    type Tree<'s>
        = git2::Tree<'s>
    where
        Self: 's;
    type Commit<'s>
        = git2::Commit<'s>
    where
        Self: 's;

    fn location(&self) -> Result<&Path, StoreError> {
        Ok(self.repo.path())
    }

    fn default_identity(&self) -> Result<Option<Identity>, StoreError> {
        match self.repo.signature() {
            Ok(sig) => Ok(Some(Identity {
                name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
                email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            })),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(StoreError::from_git2(e, "user.name/user.email")),
        }
    }

    fn create_signature(&self, spec: &SignatureSpec) -> Result<Self::Signature, StoreError> {
        let when = git2::Time::new(spec.when().seconds, spec.when().offset_minutes);
        git2::Signature::new(spec.name(), spec.email(), &when)
            .map_err(|e| StoreError::from_git2(e, "signature"))
    }

    fn status(&self, scope: StatusScope) -> Result<Vec<StatusEntry>, StoreError> {
        let show = match scope {
            StatusScope::IndexOnly => git2::StatusShow::Index,
        };

        let mut opts = git2::StatusOptions::new();
        opts.show(show).include_untracked(false).include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| StoreError::from_git2(e, "status"))?;

        Ok(statuses
            .iter()
            .map(|entry| {
                let path = String::from_utf8_lossy(entry.path_bytes()).into_owned();
                StatusEntry::new(path, to_flags(entry.status()))
            })
            .collect())
    }

    fn open_index(&self) -> Result<Self::Index<'_>, StoreError> {
        self.repo
            .index()
            .map_err(|e| StoreError::from_git2(e, "index"))
    }

    fn index_entry_count(&self, index: &Self::Index<'_>) -> usize {
        index.len()
    }

    fn write_tree(&self, index: &mut Self::Index<'_>) -> Result<Oid, StoreError> {
        let id = index
            .write_tree()
            .map_err(|e| StoreError::from_git2(e, "write tree"))?;
        to_oid(id)
    }

    fn lookup_tree(&self, id: &Oid) -> Result<Self::Tree<'_>, StoreError> {
        self.repo
            .find_tree(to_git2(id)?)
            .map_err(|e| StoreError::from_git2(e, id.as_str()))
    }

    fn lookup_commit(&self, id: &Oid) -> Result<Self::Commit<'_>, StoreError> {
        self.repo
            .find_commit(to_git2(id)?)
            .map_err(|e| StoreError::from_git2(e, id.as_str()))
    }

    fn commit_tree_id(&self, commit: &Self::Commit<'_>) -> Oid {
        to_oid(commit.tree_id()).unwrap_or_else(|_| Oid::zero())
    }

    fn commit_record(&self, commit: &Self::Commit<'_>) -> Result<CommitRecord, StoreError> {
        let parent_ids = commit
            .parent_ids()
            .map(to_oid)
            .collect::<Result<Vec<_>, _>>()?;

        let message = String::from_utf8_lossy(commit.message_bytes()).into_owned();
        let summary = commit
            .summary_bytes()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .unwrap_or_default();

        Ok(CommitRecord {
            id: to_oid(commit.id())?,
            tree_id: to_oid(commit.tree_id())?,
            parent_ids,
            author: to_signature(&commit.author()),
            committer: to_signature(&commit.committer()),
            summary,
            message,
        })
    }

    fn create_commit<'s>(&'s self, commit: NewCommit<'_, 's, Self>) -> Result<Oid, StoreError> {
        let parents: Vec<&git2::Commit<'s>> = commit.parents.iter().collect();

        let id = self
            .repo
            .commit(
                Some(commit.update_ref.as_str()),
                commit.author,
                commit.committer,
                commit.message,
                commit.tree,
                &parents,
            )
            .map_err(|e| match e.code() {
                // libgit2 reports a moved tip as a generic error on some paths
                git2::ErrorCode::Modified | git2::ErrorCode::GenericError
                    if e.message().contains("current tip") =>
                {
                    StoreError::RefModified {
                        refname: commit.update_ref.to_string(),
                        message: e.message().to_string(),
                    }
                }
                _ => StoreError::from_git2(e, commit.update_ref.as_str()),
            })?;

        to_oid(id)
    }
}
