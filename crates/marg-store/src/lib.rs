//! Commit-based versioned object repository for Marginalia.
//!
//! Objects (a class tag plus named text properties) live in snapshots; every
//! snapshot belongs to a commit; branches are named pointers to commits. All
//! writes go through [`Transaction`]s:
//!
//! ```text
//! Begin { base } -> Create | Update | Delete ... -> Commit { branch, author, committer, message }
//! ```
//!
//! A transaction lands only if the branch head still equals `base`
//! (optimistic concurrency); otherwise the store answers
//! [`StoreError::Conflict`] and the caller decides whether to rebuild and
//! retry.
//!
//! # Storage Backends
//!
//! All backends implement the [`VersionedStore`] trait:
//!
//! - [`InMemoryVersionedStore`] -- lock-guarded commit graph for tests and embedding
//! - [`DirectoryStore`] -- the same graph persisted as files under one directory
//!
//! # Design Rules
//!
//! 1. Commits are immutable and content-addressed.
//! 2. Reads resolve one commit and see exactly its snapshot.
//! 3. Head check, commit, and ref advance happen under one write lock.
//! 4. The store never interprets object properties.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod commit;
pub mod disk;
pub mod error;
pub mod graph;
pub mod memory;
pub mod meta;
pub mod object;
pub mod refs;
pub mod snapshot;
pub mod traits;
pub mod transaction;

pub use commit::{Change, Commit};
pub use disk::DirectoryStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryVersionedStore;
pub use meta::{RepositoryMeta, ANNOTATION_SCHEMA};
pub use object::StoreObject;
pub use refs::{validate_branch_name, DEFAULT_BRANCH};
pub use snapshot::Snapshot;
pub use traits::VersionedStore;
pub use transaction::{Action, CommitInfo, Transaction, TransactionParts};
