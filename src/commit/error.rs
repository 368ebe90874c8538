//! commit::error
//!
//! Terminal failures of a commit attempt.

use thiserror::Error;

use crate::core::signature::SignatureError;
use crate::core::types::TypeError;
use crate::store::StoreError;

/// Why a commit attempt failed.
///
/// Every variant is terminal for the call. No variant ever leaves a new
/// commit referenced: the only mutating store call runs after every check
/// and lookup has succeeded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommitError {
    /// Malformed message, signature or parent list.
    #[error("invalid arguments to commit: {0}")]
    InvalidArgument(String),

    /// The repository handle is missing or closed.
    #[error("invalid repository: {0}")]
    RepositoryUnavailable(String),

    /// Nothing is staged. Stage changes and try again.
    #[error("nothing added to commit")]
    EmptyCommit,

    /// The parent-handle buffer could not be allocated.
    #[error("unable to allocate memory buffer for {count} parents")]
    AllocationFailure {
        /// Requested number of parents
        count: usize,
    },

    /// A parent id could not be decoded or does not name a commit.
    #[error("unknown parent at position {position}: {id} ({reason})")]
    UnknownParent {
        /// Position in the caller's parent list
        position: usize,
        /// The id as supplied
        id: String,
        /// Decode or lookup failure detail
        reason: String,
    },

    /// Any other store failure.
    #[error("store error {code}: {message}")]
    StoreOperationFailed {
        /// Store error code
        code: i32,
        /// Store error message
        message: String,
    },
}

impl CommitError {
    /// Name of the failure category.
    ///
    /// ```
    /// use commitwork::commit::CommitError;
    ///
    /// assert_eq!(CommitError::EmptyCommit.category(), "EmptyCommit");
    /// ```
    pub fn category(&self) -> &'static str {
        match self {
            CommitError::InvalidArgument(_) => "InvalidArgument",
            CommitError::RepositoryUnavailable(_) => "RepositoryUnavailable",
            CommitError::EmptyCommit => "EmptyCommit",
            CommitError::AllocationFailure { .. } => "AllocationFailure",
            CommitError::UnknownParent { .. } => "UnknownParent",
            CommitError::StoreOperationFailed { .. } => "StoreOperationFailed",
        }
    }

    /// True when the caller can fix its input and re-invoke.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CommitError::EmptyCommit
                | CommitError::UnknownParent { .. }
                | CommitError::InvalidArgument(_)
        )
    }
}

impl From<StoreError> for CommitError {
    fn from(err: StoreError) -> Self {
        CommitError::StoreOperationFailed {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<SignatureError> for CommitError {
    fn from(err: SignatureError) -> Self {
        CommitError::InvalidArgument(err.to_string())
    }
}

impl From<TypeError> for CommitError {
    fn from(err: TypeError) -> Self {
        CommitError::InvalidArgument(err.to_string())
    }
}
