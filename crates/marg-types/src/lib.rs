//! Foundation types for Marginalia.
//!
//! This crate provides the identity and temporal types shared by the
//! versioned store, the annotation core, and the HTTP surface.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Store-assigned identity of an object (UUID v7)
//! - [`CommitId`] -- Content-addressed commit identifier (BLAKE3 hash)
//! - [`Identity`] / [`Signature`] -- Author and committer identities with time
//! - [`timestamp`] -- Microsecond-precision UTC timestamps and their wire form

pub mod commit;
pub mod error;
pub mod identity;
pub mod object;
pub mod timestamp;

pub use commit::CommitId;
pub use error::TypeError;
pub use identity::{Identity, Signature};
pub use object::ObjectId;
pub use timestamp::Timestamp;
