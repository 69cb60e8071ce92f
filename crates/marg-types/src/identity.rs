use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::{self, Timestamp};

/// A named actor that authors or commits changes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Sign at the given instant.
    pub fn at(&self, when: Timestamp) -> Signature {
        Signature {
            identity: self.clone(),
            when,
        }
    }

    /// Sign at the current time.
    pub fn now(&self) -> Signature {
        self.at(timestamp::now())
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("marginalia", "marginalia@localhost")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// An identity stamped with the time it acted, as recorded on a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(flatten)]
    pub identity: Identity,
    pub when: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let id = Identity::new("Ada", "ada@example.org");
        assert_eq!(id.to_string(), "Ada <ada@example.org>");
    }

    #[test]
    fn default_identity() {
        let id = Identity::default();
        assert_eq!(id.name, "marginalia");
    }

    #[test]
    fn signature_serializes_flat() {
        let sig = Identity::new("a", "a@x").at(timestamp::parse("2026-01-01T00:00:00Z").unwrap());
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["name"], "a");
        assert_eq!(json["email"], "a@x");
        assert!(json["when"].is_string());
        let back: Signature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }
}
