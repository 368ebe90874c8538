//! commit::staged
//!
//! Refuses to commit when the staging area holds no change.

use tracing::debug;

use crate::core::status::{first_staged, StatusEntry, StatusScope};
use crate::store::ObjectStore;

use super::CommitError;

/// Return the first staged change, or `EmptyCommit` if there is none.
///
/// Only the HEAD-vs-index half of status is requested; working directory
/// edits that were never staged do not count.
pub(crate) fn ensure_staged_changes<S>(store: &S) -> Result<StatusEntry, CommitError>
where
    S: ObjectStore + ?Sized,
{
    let entries = store.status(StatusScope::IndexOnly)?;

    match first_staged(&entries) {
        Some(entry) => {
            debug!(path = %entry.path, entries = entries.len(), "found staged change");
            Ok(entry.clone())
        }
        None => Err(CommitError::EmptyCommit),
    }
}
