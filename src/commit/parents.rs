//! commit::parents
//!
//! Turns the caller's textual parent ids into commit handles.
//!
//! Each position is decoded from its own entry. Handles are collected in
//! list order and released together when the returned vector drops, so a
//! failure at position `k` releases the `k` handles already resolved.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::Oid;
use crate::store::ObjectStore;

use super::CommitError;

/// Ordered parent commit ids, as supplied by the caller.
///
/// Order is significant (first parent first). Entries are validated only when
/// resolved, so a bad entry is reported with its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentList(Vec<String>);

impl ParentList {
    pub fn new<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    /// An empty list; the commit will be a root commit.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_oids<'a>(ids: impl IntoIterator<Item = &'a Oid>) -> Self {
        Self(ids.into_iter().map(|id| id.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ParentList {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

/// Look up every parent, in order.
///
/// # Errors
///
/// - [`CommitError::AllocationFailure`] if the handle buffer cannot be reserved
/// - [`CommitError::UnknownParent`] for the first entry that is not a valid
///   id or does not name a commit in the store
pub(crate) fn resolve_parents<'s, S>(
    store: &'s S,
    parents: &ParentList,
) -> Result<Vec<S::Commit<'s>>, CommitError>
where
    S: ObjectStore + ?Sized,
{
    let mut handles = Vec::new();
    handles
        .try_reserve_exact(parents.len())
        .map_err(|_| CommitError::AllocationFailure {
            count: parents.len(),
        })?;

    for (position, raw) in parents.iter().enumerate() {
        let unknown = |reason: String| CommitError::UnknownParent {
            position,
            id: raw.to_string(),
            reason,
        };

        let id = Oid::new(raw).map_err(|e| unknown(e.to_string()))?;
        let commit = store.lookup_commit(&id).map_err(|e| unknown(e.to_string()))?;
        debug!(position, parent = %id, "resolved parent");
        handles.push(commit);
    }

    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{HandleKind, MockStore};

    fn store_with_history(n: usize) -> (MockStore, Vec<Oid>) {
        let store = MockStore::new();
        let mut ids = Vec::new();
        for i in 0..n {
            store.stage_file(&format!("f{i}.txt"), format!("{i}").as_bytes());
            ids.push(store.seed_commit(&format!("commit {i}"), &[]));
        }
        (store, ids)
    }

    #[test]
    fn empty_list_resolves_to_nothing() {
        let store = MockStore::new();
        let handles = resolve_parents(&store, &ParentList::root()).unwrap();
        assert!(handles.is_empty());
        assert_eq!(store.calls(), Vec::new());
    }

    #[test]
    fn each_position_resolves_its_own_id() {
        let (store, ids) = store_with_history(3);
        let handles = resolve_parents(&store, &ParentList::from_oids(&ids)).unwrap();

        let resolved: Vec<Oid> = handles.iter().map(|h| h.id().clone()).collect();
        assert_eq!(resolved, ids);
        assert_eq!(store.handle_stats(HandleKind::Commit).live(), 3);
    }

    #[test]
    fn undecodable_entry_reports_position() {
        let (store, ids) = store_with_history(2);
        let parents = ParentList::new([ids[0].to_string(), "not-a-sha".to_string()]);

        let err = resolve_parents(&store, &parents).unwrap_err();
        match err {
            CommitError::UnknownParent { position, id, .. } => {
                assert_eq!(position, 1);
                assert_eq!(id, "not-a-sha");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.handle_stats(HandleKind::Commit).acquired, 1);
        assert_eq!(store.live_handles(), 0);
    }

    #[test]
    fn missing_commit_is_unknown_parent() {
        let (store, ids) = store_with_history(1);
        let missing = "ab".repeat(20);
        let parents = ParentList::new([missing.clone(), ids[0].to_string()]);

        let err = resolve_parents(&store, &parents).unwrap_err();
        assert_eq!(
            err,
            CommitError::UnknownParent {
                position: 0,
                id: missing.clone(),
                reason: format!("object not found: {missing}"),
            }
        );
        assert_eq!(store.live_handles(), 0);
    }

    #[test]
    fn serializes_as_plain_list() {
        let parents = ParentList::new(["a", "b"]);
        assert_eq!(serde_json::to_string(&parents).unwrap(), r#"["a","b"]"#);
    }
}
