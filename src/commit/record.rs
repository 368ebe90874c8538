//! commit::record
//!
//! Canonical records handed to the result mapper.
//!
//! These are plain data: ids as validated [`Oid`]s, signatures as the store
//! normalized them. The mapper projects them into whatever the embedding
//! layer needs; nothing here depends on that layer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::signature::Signature;
use crate::core::types::Oid;

/// A commit as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: Oid,
    pub tree_id: Oid,
    /// Parent ids in stored order.
    pub parent_ids: Vec<Oid>,
    pub author: Signature,
    pub committer: Signature,
    /// First paragraph of the message, line breaks collapsed.
    pub summary: String,
    pub message: String,
}

impl CommitRecord {
    /// True for a commit without parents.
    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

/// A tree as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub id: Oid,
}

/// Everything a successful commit hands to the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub commit: CommitRecord,
    pub tree: TreeRecord,
    /// Path of the repository the commit was created in.
    pub repo_path: PathBuf,
}

/// Derive a commit summary the way git does.
///
/// Leading line feeds are skipped and the first paragraph becomes one line.
/// A paragraph ends at an empty or whitespace-only line. Whitespace runs that
/// span a line break collapse to one space; other runs, including leading
/// ones, are kept as written. Trailing whitespace is dropped.
///
/// ```
/// use commitwork::commit::record::summarize;
///
/// assert_eq!(summarize("Initial commit\n\nBody"), "Initial commit");
/// assert_eq!(summarize("\n\nWrapped\nsubject\n"), "Wrapped subject");
/// assert_eq!(summarize("  lead  x\n"), "  lead  x");
/// ```
pub fn summarize(message: &str) -> String {
    let message = message.trim_start_matches('\n');
    let mut summary = String::new();
    // Start of the pending whitespace run, and whether it holds a line break.
    let mut space: Option<(usize, bool)> = None;

    for (i, c) in message.char_indices() {
        if c == '\n' {
            let next_line = message[i + 1..].trim_start_matches(is_space_nonlf);
            if next_line.is_empty() || next_line.starts_with('\n') {
                break;
            }
        }

        if is_space(c) {
            let run = space.get_or_insert((i, false));
            run.1 |= c == '\n';
        } else {
            if let Some((start, newline)) = space.take() {
                if newline {
                    summary.push(' ');
                } else {
                    summary.push_str(&message[start..i]);
                }
            }
            summary.push(c);
        }
    }

    summary
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

fn is_space_nonlf(c: char) -> bool {
    c != '\n' && is_space(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signature::SignatureTime;

    fn signature() -> Signature {
        Signature {
            name: "Test User".into(),
            email: "test@example.com".into(),
            when: SignatureTime::new(1_700_000_000, 0),
        }
    }

    #[test]
    fn summary_of_single_line() {
        assert_eq!(summarize("Fix bug"), "Fix bug");
        assert_eq!(summarize("Fix bug\n"), "Fix bug");
    }

    #[test]
    fn summary_stops_at_blank_line() {
        assert_eq!(summarize("Subject\n\nLong body\nmore"), "Subject");
    }

    #[test]
    fn summary_keeps_leading_and_inner_spacing() {
        assert_eq!(summarize("  lead  x\n"), "  lead  x");
        assert_eq!(summarize("a\tb  \n  c"), "a\tb c");
        assert_eq!(summarize("trailing   \n"), "trailing");
    }

    #[test]
    fn summary_stops_at_whitespace_only_line() {
        assert_eq!(summarize("Subject\n  \t\nBody"), "Subject");
    }

    #[test]
    fn summary_of_blank_message() {
        assert_eq!(summarize(""), "");
        assert_eq!(summarize("\n\n"), "");
        assert_eq!(summarize(" \n"), "");
    }

    #[test]
    fn root_commit_detection() {
        let record = CommitRecord {
            id: Oid::new("a".repeat(40)).unwrap(),
            tree_id: Oid::new("b".repeat(40)).unwrap(),
            parent_ids: vec![],
            author: signature(),
            committer: signature(),
            summary: "Initial commit".into(),
            message: "Initial commit\n".into(),
        };
        assert!(record.is_root());
    }

    #[test]
    fn outcome_serializes_ids_as_hex() {
        let tree = TreeRecord {
            id: Oid::new("b".repeat(40)).unwrap(),
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["id"], "b".repeat(40));
    }
}
