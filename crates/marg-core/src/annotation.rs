//! The annotation record: a fixed identity core plus an open field map.

use marg_types::{timestamp, Timestamp};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Keys owned by the repository; callers can never set them.
pub const RESERVED_KEYS: [&str; 3] = ["id", "created", "updated"];

/// Caller-supplied fields, passed through unmodified.
pub type Fields = Map<String, Value>;

/// A stored annotation.
///
/// `id` and `created` are written once at creation. `updated` is set by the
/// repository on every write and never moves backwards. Everything else
/// (`uri`, `text`, ranges, permissions, ...) lives in `fields`.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: String,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub fields: Fields,
}

impl Annotation {
    /// A new record with a fresh id and `created == updated == now`.
    pub fn create(fields: Fields, now: Timestamp) -> Self {
        Self {
            id: new_annotation_id(),
            created: now,
            updated: now,
            fields: strip_reserved(fields),
        }
    }

    /// The subject URI, if present and a string.
    pub fn uri(&self) -> Option<&str> {
        self.fields.get("uri").and_then(Value::as_str)
    }

    /// The free text, if present and a string.
    pub fn text(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }

    /// Merge `patch` over this record and refresh `updated`.
    ///
    /// Reserved keys in the patch are ignored. Patch values win per key.
    /// `updated` becomes `max(now, previous updated)`.
    pub fn apply_patch(&mut self, patch: Fields, now: Timestamp) {
        self.fields.extend(strip_reserved(patch));
        self.updated = now.max(self.updated);
    }

    /// The flat JSON object form: reserved keys first, then fields.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(self.fields.len() + 3);
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("created".into(), Value::String(timestamp::format(&self.created)));
        map.insert("updated".into(), Value::String(timestamp::format(&self.updated)));
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Remove the reserved keys from a field map.
pub fn strip_reserved(mut fields: Fields) -> Fields {
    for key in RESERVED_KEYS {
        fields.remove(key);
    }
    fields
}

/// A fresh annotation id: 32 lowercase hex characters.
pub fn new_annotation_id() -> String {
    Uuid::new_v4().simple().to_string()
}
