//! Annotation storage on top of a versioned object repository.
//!
//! [`AnnotationRepository`] turns create/read/update/delete/search on
//! annotation records into reads and single-mutation transactions against a
//! [`VersionedStore`](marg_store::VersionedStore) branch:
//!
//! - [`codec`] maps a record to one store object with a `json` property
//! - [`transaction`] builds `Begin -> mutation -> Commit` action lists
//! - [`search`] filters and paginates the current snapshot
//!
//! Writes never retry. A lost race surfaces as [`AnnotationError::Conflict`].

pub mod annotation;
pub mod codec;
pub mod error;
pub mod repository;
pub mod search;
pub mod transaction;

pub use annotation::{Annotation, Fields, RESERVED_KEYS};
pub use codec::{ANNOTATION_CLASS, JSON_PROPERTY};
pub use error::{AnnotationError, AnnotationResult};
pub use repository::AnnotationRepository;
pub use search::{SearchQuery, SearchResult, DEFAULT_LIMIT};
pub use transaction::{PendingCommit, TransactionBuilder};
