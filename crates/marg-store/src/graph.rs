//! In-memory commit graph shared by every store backend.
//!
//! Holds the commits, the branch refs, and a bounded cache of materialized
//! snapshots. Snapshots that fall out of the cache are rebuilt on demand by
//! replaying changes forward from the nearest cached ancestor (or the root).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use marg_types::{CommitId, Signature};

use crate::commit::Commit;
use crate::error::{StoreError, StoreResult};
use crate::refs::validate_branch_name;
use crate::snapshot::Snapshot;
use crate::transaction::Transaction;

/// Number of non-head snapshots kept materialized.
const SNAPSHOT_CACHE_SIZE: usize = 32;

/// A commit validated against the current graph, ready to be recorded.
#[derive(Debug)]
pub struct StagedCommit {
    pub branch: String,
    pub commit: Commit,
    pub snapshot: Snapshot,
}

#[derive(Debug, Default)]
pub struct CommitGraph {
    commits: HashMap<CommitId, Arc<Commit>>,
    refs: BTreeMap<String, CommitId>,
    snapshots: HashMap<CommitId, Arc<Snapshot>>,
    recent: VecDeque<CommitId>,
}

impl CommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self, branch: &str) -> Option<CommitId> {
        self.refs.get(branch).copied()
    }

    pub fn branches(&self) -> Vec<(String, CommitId)> {
        self.refs.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    pub fn commit(&self, id: &CommitId) -> Option<Arc<Commit>> {
        self.commits.get(id).cloned()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// The snapshot at `id`, from cache or by replay.
    pub fn snapshot_at(&self, id: &CommitId) -> StoreResult<Arc<Snapshot>> {
        if let Some(snapshot) = self.snapshots.get(id) {
            return Ok(Arc::clone(snapshot));
        }

        // Walk back to the nearest materialized ancestor.
        let mut pending = Vec::new();
        let mut cursor = Some(*id);
        let mut base = Snapshot::new();
        while let Some(current) = cursor {
            if let Some(snapshot) = self.snapshots.get(&current) {
                base = Snapshot::clone(&**snapshot);
                break;
            }
            let commit = self
                .commits
                .get(&current)
                .ok_or(StoreError::CommitNotFound(current))?;
            pending.push(Arc::clone(commit));
            cursor = commit.parent;
        }

        for commit in pending.iter().rev() {
            for change in &commit.changes {
                base.apply_change(change);
            }
        }
        tracing::debug!(commit = %id.short_hex(), replayed = pending.len(), "rebuilt snapshot");
        Ok(Arc::new(base))
    }

    /// Validate a transaction against the branch head and compute its commit.
    ///
    /// Nothing is recorded; pass the result to [`CommitGraph::record`].
    pub fn stage(&self, tx: &Transaction) -> StoreResult<StagedCommit> {
        let parts = tx.parts()?;
        let branch = &parts.info.branch;
        let head = self
            .head(branch)
            .ok_or_else(|| StoreError::RefNotFound(branch.clone()))?;
        if head != parts.base {
            return Err(StoreError::Conflict {
                branch: branch.clone(),
                expected: parts.base,
                actual: head,
            });
        }

        let mut snapshot = Snapshot::clone(&*self.snapshot_at(&head)?);
        let changes = snapshot.apply_actions(parts.mutations)?;
        let commit = Commit::seal(
            Some(head),
            parts.info.author.clone(),
            parts.info.committer.clone(),
            parts.info.message.clone(),
            changes,
        )?;
        Ok(StagedCommit {
            branch: branch.clone(),
            commit,
            snapshot,
        })
    }

    /// Stage the root commit of a new branch.
    pub fn stage_root(
        &self,
        branch: &str,
        committer: Signature,
        message: &str,
    ) -> StoreResult<StagedCommit> {
        validate_branch_name(branch)?;
        let commit = Commit::seal(None, committer.clone(), committer, message, Vec::new())?;
        Ok(StagedCommit {
            branch: branch.to_string(),
            commit,
            snapshot: Snapshot::new(),
        })
    }

    /// Record a staged commit and advance its branch.
    pub fn record(&mut self, staged: StagedCommit) -> CommitId {
        let id = staged.commit.id;
        self.commits.insert(id, Arc::new(staged.commit));
        self.refs.insert(staged.branch, id);
        self.cache(id, Arc::new(staged.snapshot));
        id
    }

    /// Insert a commit loaded from storage without touching refs or the cache.
    pub fn insert_commit(&mut self, commit: Commit) {
        self.commits.insert(commit.id, Arc::new(commit));
    }

    /// Point a branch at an existing commit.
    pub fn set_ref(&mut self, branch: &str, id: CommitId) -> StoreResult<()> {
        validate_branch_name(branch)?;
        if !self.commits.contains_key(&id) {
            return Err(StoreError::CommitNotFound(id));
        }
        self.refs.insert(branch.to_string(), id);
        Ok(())
    }

    /// Materialize and cache the snapshot of every branch head.
    pub fn warm_heads(&mut self) -> StoreResult<()> {
        let heads: Vec<CommitId> = self.refs.values().copied().collect();
        for head in heads {
            let snapshot = self.snapshot_at(&head)?;
            self.cache(head, snapshot);
        }
        Ok(())
    }

    /// Commits reachable from `branch`, newest first.
    pub fn history(&self, branch: &str, limit: usize) -> StoreResult<Vec<Commit>> {
        let mut cursor = Some(
            self.head(branch)
                .ok_or_else(|| StoreError::RefNotFound(branch.to_string()))?,
        );
        let mut out = Vec::new();
        while let Some(id) = cursor {
            if out.len() >= limit {
                break;
            }
            let commit = self.commits.get(&id).ok_or(StoreError::CommitNotFound(id))?;
            out.push(Commit::clone(&**commit));
            cursor = commit.parent;
        }
        Ok(out)
    }

    fn cache(&mut self, id: CommitId, snapshot: Arc<Snapshot>) {
        if self.snapshots.insert(id, snapshot).is_none() {
            self.recent.push_back(id);
        }
        while self.recent.len() > SNAPSHOT_CACHE_SIZE {
            // Branch heads stay materialized.
            let Some(pos) = self
                .recent
                .iter()
                .position(|c| !self.refs.values().any(|head| head == c))
            else {
                break;
            };
            if let Some(evicted) = self.recent.remove(pos) {
                self.snapshots.remove(&evicted);
            }
        }
    }
}
