use marg_types::{timestamp, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::refs::DEFAULT_BRANCH;

/// Schema identifier written by `marg setup`.
pub const ANNOTATION_SCHEMA: &str = "marginalia/annotation/v1";

/// Descriptive metadata of a repository, stored as `repository.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMeta {
    /// Human-readable store name.
    pub name: String,
    /// Identifier of the object schema the repository holds.
    pub schema: String,
    /// Branch created at initialization.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    pub created: Timestamp,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl RepositoryMeta {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            default_branch: default_branch(),
            created: timestamp::now(),
        }
    }

    /// Metadata for an annotation store.
    pub fn annotations(name: impl Into<String>) -> Self {
        Self::new(name, ANNOTATION_SCHEMA)
    }

    pub fn to_toml(&self) -> StoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::Metadata(e.to_string()))
    }

    pub fn from_toml(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Metadata(e.to_string()))
    }
}
