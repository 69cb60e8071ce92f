use marg_types::CommitId;

use crate::commit::Commit;
use crate::error::StoreResult;
use crate::meta::RepositoryMeta;
use crate::object::StoreObject;
use crate::transaction::Transaction;

/// A commit-based versioned object repository.
///
/// All implementations must satisfy these invariants:
/// - Reads at a commit see exactly that commit's snapshot; a commit never
///   changes once recorded.
/// - `apply_transaction` is atomic: either the whole action list lands as
///   one commit and the branch advances, or nothing changes.
/// - A transaction is accepted only while the branch head equals its
///   `Begin` base. Otherwise the result is `StoreError::Conflict`.
/// - The store never interprets object properties.
pub trait VersionedStore: Send + Sync {
    /// Descriptive metadata of the repository.
    fn meta(&self) -> &RepositoryMeta;

    /// The head commit of `branch`, or `Ok(None)` if the branch does not exist.
    fn head(&self, branch: &str) -> StoreResult<Option<CommitId>>;

    /// Objects of `class` at `commit`, ordered by object id.
    ///
    /// Returns `StoreError::UnknownClass` if no object of the class has ever
    /// existed at that commit.
    fn objects_of_class(&self, commit: &CommitId, class: &str) -> StoreResult<Vec<StoreObject>>;

    /// Apply a transaction and return the id of the new branch head.
    fn apply_transaction(&self, tx: &Transaction) -> StoreResult<CommitId>;

    /// Up to `limit` commits reachable from `branch`, newest first.
    fn history(&self, branch: &str, limit: usize) -> StoreResult<Vec<Commit>>;
}
