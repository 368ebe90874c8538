//! commit::phase
//!
//! States of a commit attempt.
//!
//! ```text
//! Uncommitted -> Validating -> Diffing -> BuildingTree
//!             -> ResolvingParents -> Assembling -> Committed
//! ```
//!
//! Any state before `Committed` may end the attempt with a
//! [`CommitError`](super::CommitError) instead.

/// A step of the commit pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommitPhase {
    Uncommitted,
    Validating,
    Diffing,
    BuildingTree,
    ResolvingParents,
    Assembling,
    Committed,
}

impl CommitPhase {
    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        use CommitPhase::*;
        match self {
            Uncommitted => Some(Validating),
            Validating => Some(Diffing),
            Diffing => Some(BuildingTree),
            BuildingTree => Some(ResolvingParents),
            ResolvingParents => Some(Assembling),
            Assembling => Some(Committed),
            Committed => None,
        }
    }

    /// True once the store has been mutated.
    pub fn is_terminal(self) -> bool {
        self == CommitPhase::Committed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommitPhase::Uncommitted => "uncommitted",
            CommitPhase::Validating => "validating",
            CommitPhase::Diffing => "diffing",
            CommitPhase::BuildingTree => "building-tree",
            CommitPhase::ResolvingParents => "resolving-parents",
            CommitPhase::Assembling => "assembling",
            CommitPhase::Committed => "committed",
        }
    }
}

impl std::fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
