use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use marg_types::{CommitId, Identity};

use crate::commit::Commit;
use crate::error::{StoreError, StoreResult};
use crate::graph::CommitGraph;
use crate::meta::RepositoryMeta;
use crate::object::StoreObject;
use crate::traits::VersionedStore;
use crate::transaction::Transaction;

/// In-memory versioned store.
///
/// Intended for tests and embedding. The commit graph lives behind a
/// `RwLock`: reads share it, and `apply_transaction` holds the write lock
/// across the head check and the branch advance. Data is lost when the store
/// is dropped.
pub struct InMemoryVersionedStore {
    meta: RepositoryMeta,
    graph: RwLock<CommitGraph>,
}

impl InMemoryVersionedStore {
    /// Create an uninitialized store: no branches, no commits.
    pub fn new(meta: RepositoryMeta) -> Self {
        Self {
            meta,
            graph: RwLock::new(CommitGraph::new()),
        }
    }

    /// Create a store whose default branch holds an empty root commit.
    pub fn initialized(meta: RepositoryMeta) -> StoreResult<Self> {
        let store = Self::new(meta);
        let branch = store.meta.default_branch.clone();
        store.create_branch(&branch, &Identity::default())?;
        Ok(store)
    }

    /// Write an empty root commit and point `branch` at it.
    pub fn create_branch(&self, branch: &str, committer: &Identity) -> StoreResult<CommitId> {
        let mut graph = self.write()?;
        let staged = graph.stage_root(branch, committer.now(), "Initialize repository")?;
        Ok(graph.record(staged))
    }

    /// Number of commits across all branches.
    pub fn commit_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.commit_count())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, CommitGraph>> {
        self.graph.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, CommitGraph>> {
        self.graph.write().map_err(|_| StoreError::Poisoned)
    }
}

impl VersionedStore for InMemoryVersionedStore {
    fn meta(&self) -> &RepositoryMeta {
        &self.meta
    }

    fn head(&self, branch: &str) -> StoreResult<Option<CommitId>> {
        Ok(self.read()?.head(branch))
    }

    fn objects_of_class(&self, commit: &CommitId, class: &str) -> StoreResult<Vec<StoreObject>> {
        let snapshot = self.read()?.snapshot_at(commit)?;
        snapshot
            .objects_of_class(class)
            .ok_or_else(|| StoreError::UnknownClass(class.to_string()))
    }

    fn apply_transaction(&self, tx: &Transaction) -> StoreResult<CommitId> {
        let mut graph = self.write()?;
        let staged = graph.stage(tx)?;
        let changes = staged.commit.changes.len();
        let id = graph.record(staged);
        tracing::debug!(commit = %id.short_hex(), changes, "applied transaction");
        Ok(id)
    }

    fn history(&self, branch: &str, limit: usize) -> StoreResult<Vec<Commit>> {
        self.read()?.history(branch, limit)
    }
}

impl std::fmt::Debug for InMemoryVersionedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let commits = self.commit_count().unwrap_or_default();
        f.debug_struct("InMemoryVersionedStore")
            .field("name", &self.meta.name)
            .field("commit_count", &commits)
            .finish()
    }
}
