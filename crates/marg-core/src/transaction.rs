//! Building single-mutation transactions against an observed branch head.

use std::collections::BTreeMap;

use marg_store::{Action, CommitInfo, Transaction};
use marg_types::{CommitId, ObjectId, Signature};

/// A transaction opened against `base`, waiting for its one mutation.
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    branch: String,
    base: CommitId,
}

impl TransactionBuilder {
    /// Open a transaction on `branch` at the head the caller just observed.
    pub fn begin(branch: impl Into<String>, base: CommitId) -> Self {
        Self {
            branch: branch.into(),
            base,
        }
    }

    pub fn create(self, class: impl Into<String>, properties: BTreeMap<String, String>) -> PendingCommit {
        self.with(Action::Create {
            class: class.into(),
            properties,
        })
    }

    /// Drop the `remove` properties of `object`, then write `set`.
    pub fn update(
        self,
        object: ObjectId,
        remove: Vec<String>,
        set: BTreeMap<String, String>,
    ) -> PendingCommit {
        self.with(Action::Update { object, remove, set })
    }

    pub fn delete(self, object: ObjectId) -> PendingCommit {
        self.with(Action::Delete { object })
    }

    fn with(self, mutation: Action) -> PendingCommit {
        PendingCommit {
            branch: self.branch,
            base: self.base,
            mutation,
        }
    }
}

/// A transaction with its mutation chosen; only the commit info is missing.
#[derive(Clone, Debug)]
pub struct PendingCommit {
    branch: String,
    base: CommitId,
    mutation: Action,
}

impl PendingCommit {
    /// Seal into `[Begin, mutation, Commit]`.
    pub fn commit(self, author: Signature, committer: Signature, message: impl Into<String>) -> Transaction {
        Transaction::new(vec![
            Action::Begin { base: self.base },
            self.mutation,
            Action::Commit(CommitInfo {
                branch: self.branch,
                author,
                committer,
                message: message.into(),
            }),
        ])
    }
}

pub(crate) fn create_message(id: &str) -> String {
    format!("Create annotation {id}")
}

pub(crate) fn update_message(id: &str) -> String {
    format!("Update annotation {id}")
}

pub(crate) fn delete_message(id: &str) -> String {
    format!("Delete annotation {id}")
}
