//! core::status
//!
//! Staged-change detection.
//!
//! The store reports one [`StatusEntry`] per path. A commit may only be
//! created when at least one entry carries a staged (index) change; the
//! scan stops at the first such entry.

use serde::{Deserialize, Serialize};

/// Which half of the status comparison the store should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusScope {
    /// HEAD vs. index only. Working-directory edits are never reported.
    #[default]
    IndexOnly,
}

/// Change flags for a single path.
///
/// An entry with no flags set is "current": identical in HEAD, index and
/// (when requested) the working directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags {
    pub index_new: bool,
    pub index_modified: bool,
    pub index_deleted: bool,
    pub index_renamed: bool,
    pub index_typechange: bool,
    pub worktree_changed: bool,
    pub conflicted: bool,
}

impl StatusFlags {
    /// No change at all.
    pub const CURRENT: Self = Self {
        index_new: false,
        index_modified: false,
        index_deleted: false,
        index_renamed: false,
        index_typechange: false,
        worktree_changed: false,
        conflicted: false,
    };

    pub fn new_file() -> Self {
        Self {
            index_new: true,
            ..Self::CURRENT
        }
    }

    pub fn modified() -> Self {
        Self {
            index_modified: true,
            ..Self::CURRENT
        }
    }

    pub fn deleted() -> Self {
        Self {
            index_deleted: true,
            ..Self::CURRENT
        }
    }

    /// True when nothing changed for this path.
    pub fn is_current(&self) -> bool {
        *self == Self::CURRENT
    }

    /// True when the index holds a change relative to HEAD.
    pub fn is_staged(&self) -> bool {
        self.index_new
            || self.index_modified
            || self.index_deleted
            || self.index_renamed
            || self.index_typechange
    }
}

/// Status of one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub path: String,
    pub flags: StatusFlags,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, flags: StatusFlags) -> Self {
        Self {
            path: path.into(),
            flags,
        }
    }
}

/// Find the first entry carrying a staged change.
///
/// Entries that are current, or that only differ in the working directory,
/// are skipped. Returns `None` when nothing is staged.
pub fn first_staged(entries: &[StatusEntry]) -> Option<&StatusEntry> {
    entries
        .iter()
        .filter(|entry| !entry.flags.is_current())
        .find(|entry| entry.flags.is_staged())
}
