use marg_types::{CommitId, ObjectId, Signature};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::object::StoreObject;

/// Domain tag for commit hashing.
const COMMIT_DOMAIN: &str = "marg-commit-v1";

/// One effect of a commit on the snapshot of its parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Change {
    Created { object: StoreObject },
    /// Carries the full post-update state of the object.
    Updated { object: StoreObject },
    Deleted { id: ObjectId, class: String },
}

/// An immutable node of the commit graph.
///
/// A commit records its parent and the changes it applied to the parent's
/// snapshot, so any snapshot can be rebuilt by replaying from the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    /// `None` only for a branch's root commit.
    pub parent: Option<CommitId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
    pub changes: Vec<Change>,
}

/// The hashed portion of a commit (everything but the id).
#[derive(Serialize)]
struct CommitBody<'a> {
    parent: &'a Option<CommitId>,
    author: &'a Signature,
    committer: &'a Signature,
    message: &'a str,
    changes: &'a [Change],
}

impl Commit {
    /// Build a commit and compute its content-addressed id.
    pub fn seal(
        parent: Option<CommitId>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
        changes: Vec<Change>,
    ) -> StoreResult<Self> {
        let mut commit = Self {
            id: CommitId::from_hash([0; 32]),
            parent,
            author,
            committer,
            message: message.into(),
            changes,
        };
        commit.id = commit.compute_id()?;
        Ok(commit)
    }

    /// Recompute the id from the commit's contents.
    pub fn compute_id(&self) -> StoreResult<CommitId> {
        let body = CommitBody {
            parent: &self.parent,
            author: &self.author,
            committer: &self.committer,
            message: &self.message,
            changes: &self.changes,
        };
        let data =
            serde_json::to_vec(&body).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(CommitId::hash(COMMIT_DOMAIN, &data))
    }

    /// Check that the recorded id matches the contents.
    pub fn verify(&self) -> StoreResult<()> {
        let computed = self.compute_id()?;
        if computed != self.id {
            return Err(StoreError::CorruptCommit {
                id: self.id.to_hex(),
                reason: format!("content hashes to {computed}"),
            });
        }
        Ok(())
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
