//! commit::tree
//!
//! Materializes the staging area into a tree object.
//!
//! Runs only after the staged-change scan passed. The index handle is
//! released as soon as the tree is written; the tree handle lives on in
//! [`StagedTree`] until the commit is assembled.

use tracing::debug;

use crate::core::types::Oid;
use crate::store::ObjectStore;

use super::CommitError;

/// The tree written from the index, with its handle.
pub(crate) struct StagedTree<'s, S: ObjectStore + ?Sized + 's> {
    /// Id returned by `write_tree`.
    pub id: Oid,
    pub tree: S::Tree<'s>,
}

/// Write the index as a tree and look it up.
///
/// # Errors
///
/// - [`CommitError::EmptyCommit`] if the index has no entries, even when the
///   status scan found staged changes (e.g. everything was deleted)
/// - [`CommitError::StoreOperationFailed`] for any store failure
pub(crate) fn build_tree<'s, S>(store: &'s S) -> Result<StagedTree<'s, S>, CommitError>
where
    S: ObjectStore + ?Sized,
{
    let id = {
        let mut index = store.open_index()?;
        let entries = store.index_entry_count(&index);
        if entries == 0 {
            return Err(CommitError::EmptyCommit);
        }
        let id = store.write_tree(&mut index)?;
        debug!(tree = %id, entries, "wrote tree from index");
        id
    };

    let tree = store.lookup_tree(&id)?;
    Ok(StagedTree { id, tree })
}
