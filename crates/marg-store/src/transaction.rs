//! Transactions: ordered action lists applied atomically against a branch.
//!
//! A well-formed transaction is
//!
//! ```text
//! Begin { base }  Create | Update | Delete  (one or more)  Commit { .. }
//! ```
//!
//! `base` is the branch head observed when the transaction was built. The
//! store applies the transaction only while the branch head still equals
//! `base`; otherwise it answers [`StoreError::Conflict`] and changes nothing.

use std::collections::BTreeMap;

use marg_types::{CommitId, ObjectId, Signature};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Commit metadata carried by the final action of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Branch the commit advances.
    pub branch: String,
    pub author: Signature,
    pub committer: Signature,
    /// Human-readable summary; recorded for history only.
    pub message: String,
}

/// One step of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Opens the transaction against the observed branch head.
    Begin { base: CommitId },
    /// Creates a new object; the store assigns its [`ObjectId`].
    Create {
        class: String,
        properties: BTreeMap<String, String>,
    },
    /// Removes the named properties of an existing object, then sets new ones.
    Update {
        object: ObjectId,
        remove: Vec<String>,
        set: BTreeMap<String, String>,
    },
    /// Deletes an existing object.
    Delete { object: ObjectId },
    /// Closes the transaction and describes the resulting commit.
    Commit(CommitInfo),
}

impl Action {
    /// Returns `true` for create/update/delete.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Create { .. } | Self::Update { .. } | Self::Delete { .. }
        )
    }
}

/// An ordered list of actions to apply atomically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    actions: Vec<Action>,
}

/// Borrowed, validated view of a transaction.
#[derive(Debug)]
pub struct TransactionParts<'a> {
    pub base: CommitId,
    pub mutations: &'a [Action],
    pub info: &'a CommitInfo,
}

impl Transaction {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Check the shape of the action list and split it into its parts.
    pub fn parts(&self) -> StoreResult<TransactionParts<'_>> {
        let (first, rest) = self
            .actions
            .split_first()
            .ok_or_else(|| StoreError::MalformedTransaction("empty action list".into()))?;
        let base = match first {
            Action::Begin { base } => *base,
            other => {
                return Err(StoreError::MalformedTransaction(format!(
                    "first action must be Begin, got {}",
                    action_name(other)
                )))
            }
        };
        let (last, mutations) = rest.split_last().ok_or_else(|| {
            StoreError::MalformedTransaction("missing Commit action".into())
        })?;
        let info = match last {
            Action::Commit(info) => info,
            other => {
                return Err(StoreError::MalformedTransaction(format!(
                    "last action must be Commit, got {}",
                    action_name(other)
                )))
            }
        };
        if mutations.is_empty() {
            return Err(StoreError::MalformedTransaction(
                "no mutation between Begin and Commit".into(),
            ));
        }
        if let Some(stray) = mutations.iter().find(|a| !a.is_mutation()) {
            return Err(StoreError::MalformedTransaction(format!(
                "unexpected {} inside transaction body",
                action_name(stray)
            )));
        }
        Ok(TransactionParts {
            base,
            mutations,
            info,
        })
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Begin { .. } => "Begin",
        Action::Create { .. } => "Create",
        Action::Update { .. } => "Update",
        Action::Delete { .. } => "Delete",
        Action::Commit(_) => "Commit",
    }
}
