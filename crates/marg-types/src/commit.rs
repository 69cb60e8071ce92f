use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-addressed identifier of a commit.
///
/// A `CommitId` is a domain-separated BLAKE3 hash over the commit's parent,
/// change set, and metadata. Identical commits always hash to the same id.
/// Serialized as a 64-character lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CommitId([u8; 32]);

impl CommitId {
    /// Hash raw bytes under the given domain tag.
    pub fn hash(domain: &str, data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Self(*hasher.finalize().as_bytes())
    }

    /// Create a `CommitId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string. Surrounding whitespace is ignored.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.short_hex())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = CommitId::hash("d", b"payload");
        let b = CommitId::hash("d", b"payload");
        assert_eq!(a, b);
    }

    #[test]
    fn domain_separates_hashes() {
        assert_ne!(CommitId::hash("a", b"x"), CommitId::hash("b", b"x"));
    }

    #[test]
    fn hex_roundtrip() {
        let id = CommitId::hash("d", b"test");
        assert_eq!(CommitId::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(CommitId::from_hex(&format!("{id}\n")).unwrap(), id);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert_eq!(
            CommitId::from_hex("abcd"),
            Err(TypeError::InvalidLength {
                expected: 32,
                actual: 2
            })
        );
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = CommitId::from_hash([0xab; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: CommitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
