//! commit::signatures
//!
//! Builds the author and committer signatures for a commit.

use tracing::debug;

use crate::core::config::Config;
use crate::core::signature::{SignatureSpec, SignatureTime};
use crate::store::ObjectStore;

use super::CommitError;

/// Author and committer handles, built independently.
pub(crate) struct Signatures<Sig> {
    pub author: Sig,
    pub committer: Sig,
}

/// Have the store build canonical signatures for both roles.
///
/// Both `SignatureSpec`s were validated when built. A store rejection (e.g.
/// characters the object format cannot carry) surfaces as
/// `StoreOperationFailed`. If the committer fails, the author handle is
/// released before returning.
pub(crate) fn build_signatures<S>(
    store: &S,
    author: &SignatureSpec,
    committer: &SignatureSpec,
) -> Result<Signatures<S::Signature>, CommitError>
where
    S: ObjectStore + ?Sized,
{
    let author = store.create_signature(author)?;
    let committer = store.create_signature(committer)?;
    debug!("built author and committer signatures");
    Ok(Signatures { author, committer })
}

/// Build a signature spec for "now" from the configured identity.
///
/// Identity comes from the crate config first, then from the store's own
/// settings (`user.name`/`user.email` for git).
///
/// # Errors
///
/// [`CommitError::InvalidArgument`] if neither source has a complete identity.
pub fn default_signature<S>(store: &S, config: Option<&Config>) -> Result<SignatureSpec, CommitError>
where
    S: ObjectStore + ?Sized,
{
    default_signature_at(store, config, SignatureTime::now())
}

/// Like [`default_signature`] with an explicit time.
pub fn default_signature_at<S>(
    store: &S,
    config: Option<&Config>,
    when: SignatureTime,
) -> Result<SignatureSpec, CommitError>
where
    S: ObjectStore + ?Sized,
{
    let identity = match config.and_then(Config::identity) {
        Some(identity) => identity,
        None => store.default_identity()?.ok_or_else(|| {
            CommitError::InvalidArgument(
                "no identity configured (set identity.name and identity.email)".to_string(),
            )
        })?,
    };

    Ok(SignatureSpec::from_identity(&identity, when)?)
}
