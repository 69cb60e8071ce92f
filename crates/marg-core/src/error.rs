use marg_store::StoreError;
use marg_types::{CommitId, ObjectId};
use thiserror::Error;

/// Failures surfaced by the annotation repository.
///
/// A missing annotation is not an error: lookups return `Option` and
/// deletes return `bool`.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The branch moved between reading the head and applying the write.
    #[error("write conflict on {branch}: head moved from {expected} to {actual}")]
    Conflict {
        branch: String,
        expected: CommitId,
        actual: CommitId,
    },

    /// A stored object does not decode into an annotation.
    #[error("corrupt record in object {object}: {reason}")]
    CorruptRecord { object: ObjectId, reason: String },

    /// An annotation could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl AnnotationError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<StoreError> for AnnotationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                branch,
                expected,
                actual,
            } => Self::Conflict {
                branch,
                expected,
                actual,
            },
            other => Self::Store(other),
        }
    }
}

pub type AnnotationResult<T> = Result<T, AnnotationError>;
