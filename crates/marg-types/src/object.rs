use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Store-assigned identifier of an object inside the versioned repository.
///
/// An `ObjectId` is a UUID v7 minted by the store when an object is created.
/// It is stable across updates of the object and unrelated to whatever
/// identifier the object's payload carries. Ordering follows the UUID bytes,
/// which for v7 ids roughly tracks creation time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Mint a fresh, time-ordered object id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The nil object id (all zeros). Never assigned by a store.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` if this is the nil id.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Short representation (first 8 hex characters).
    pub fn short_hex(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Parse from any textual UUID form (hyphenated or simple).
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidObjectId(format!("{s}: {e}")))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
