use std::path::PathBuf;

use marg_types::{CommitId, ObjectId};

/// Errors from versioned store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named branch does not exist.
    #[error("ref not found: refs/heads/{0}")]
    RefNotFound(String),

    /// The branch name is not acceptable as a ref.
    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// No commit with this id is known to the store.
    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    /// No object of this class has ever existed at the requested commit.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// A mutation addressed an object absent from the base snapshot.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The branch head moved after the transaction's `Begin` was captured.
    #[error("conflict on {branch}: expected head {expected}, found {actual}")]
    Conflict {
        branch: String,
        expected: CommitId,
        actual: CommitId,
    },

    /// The action list is not `Begin, mutation+, Commit`.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored commit does not hash to its recorded id, or cannot be decoded.
    #[error("corrupt commit {id}: {reason}")]
    CorruptCommit { id: String, reason: String },

    /// Repository metadata is missing fields or cannot be parsed.
    #[error("invalid repository metadata: {0}")]
    Metadata(String),

    /// The directory does not contain a repository.
    #[error("repository not initialized at {}", .0.display())]
    NotInitialized(PathBuf),

    /// The directory already contains a repository.
    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for the optimistic-concurrency rejection.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` when the error only means "nothing has been stored
    /// yet": the branch or the class does not exist.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::RefNotFound(_) | Self::UnknownClass(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
