use std::collections::BTreeMap;

use marg_types::ObjectId;
use serde::{Deserialize, Serialize};

/// A typed object inside a snapshot: store-assigned id, class tag, and named
/// text properties.
///
/// The store never interprets property values. Callers that need structure
/// serialize it into a property themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreObject {
    /// Identity assigned by the store at creation; stable across updates.
    pub id: ObjectId,
    /// Class tag used for listing (e.g. `"annotation"`).
    pub class: String,
    /// Named properties, ordered by name.
    pub properties: BTreeMap<String, String>,
}

impl StoreObject {
    /// Create an object with the given identity and no properties.
    pub fn new(id: ObjectId, class: impl Into<String>) -> Self {
        Self {
            id,
            class: class.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}
