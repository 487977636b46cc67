//! Merkle Hashing
//!
//! Domain-separated SHA-256 hashing for leaves and internal nodes, in the
//! RFC 6962 layout: `H(0x00 || data)` for leaves, `H(0x01 || left || right)`
//! for internal nodes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{LogError, Result};

/// Output length of the hash primitive in bytes
pub const DIGEST_LEN: usize = 32;

/// Prefix byte for leaf hashes
pub const LEAF_PREFIX: u8 = 0x00;

/// Prefix byte for internal node hashes
pub const NODE_PREFIX: u8 = 0x01;

/// SHA-256 of the empty string, used for the self test and as the empty-tree root
const EMPTY_SHA256: [u8; DIGEST_LEN] = [
    0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9, 0x24,
    0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52, 0xb8, 0x55,
];

/// Fixed-length hash value
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode a lowercase or uppercase hex string of exactly 64 characters
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(LogError::InvalidDigest(format!(
                "expected {} hex characters, got {}",
                DIGEST_LEN * 2,
                s.len()
            )));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| LogError::InvalidDigest(format!("{}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = LogError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| {
            LogError::InvalidDigest(format!(
                "expected {} bytes, got {}",
                DIGEST_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Leaf hash: `SHA-256(0x00 || event)`
pub fn leaf_hash(event: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(event);
    Digest(hasher.finalize().into())
}

/// Internal node hash: `SHA-256(0x01 || left || right)`
pub fn node_hash(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Digest(hasher.finalize().into())
}

/// Root of the empty tree.
///
/// This is SHA-256 of the empty string with no prefix byte, so it can never
/// be confused with `leaf_hash(b"")` (which hashes the single byte `0x00`).
pub fn empty_root() -> Digest {
    Digest(EMPTY_SHA256)
}

/// Known-answer check of the hash primitive.
///
/// Run once at startup; a failure is fatal and must not be retried per call.
pub fn self_test() -> Result<()> {
    let computed: [u8; DIGEST_LEN] = Sha256::digest(b"").into();
    if computed != EMPTY_SHA256 {
        return Err(LogError::HashEngineUnavailable(
            "SHA-256 known-answer test failed".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_hash_prefix() {
        let mut hasher = Sha256::new();
        hasher.update([0x00]);
        hasher.update(b"Event1");
        let expected: [u8; DIGEST_LEN] = hasher.finalize().into();

        assert_eq!(leaf_hash(b"Event1").as_bytes(), &expected);
    }

    #[test]
    fn test_node_hash_prefix() {
        let left = leaf_hash(b"a");
        let right = leaf_hash(b"b");

        let mut hasher = Sha256::new();
        hasher.update([0x01]);
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        let expected: [u8; DIGEST_LEN] = hasher.finalize().into();

        assert_eq!(node_hash(&left, &right).as_bytes(), &expected);
        assert_ne!(node_hash(&left, &right), node_hash(&right, &left));
    }

    #[test]
    fn test_domain_separation() {
        // The same 64 bytes hashed as a leaf and as a node pair must differ
        let left = leaf_hash(b"left");
        let right = leaf_hash(b"right");
        let mut concatenated = Vec::new();
        concatenated.extend_from_slice(left.as_bytes());
        concatenated.extend_from_slice(right.as_bytes());

        assert_ne!(leaf_hash(&concatenated), node_hash(&left, &right));
    }

    #[test]
    fn test_empty_root_is_not_a_leaf() {
        assert_ne!(empty_root(), leaf_hash(b""));
        assert_eq!(
            empty_root().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_self_test_passes() {
        assert!(self_test().is_ok());
    }

    #[test]
    fn test_hex_round_trip() {
        let digest = leaf_hash(b"round trip");
        let encoded = digest.to_hex();
        assert_eq!(encoded.len(), 64);
        assert_eq!(Digest::from_hex(&encoded).unwrap(), digest);
        assert_eq!(encoded.parse::<Digest>().unwrap(), digest);
    }

    #[test]
    fn test_hex_rejects_bad_input() {
        assert!(Digest::from_hex("abcd").is_err());
        assert!(Digest::from_hex(&"zz".repeat(32)).is_err());
        assert!(Digest::from_hex(&"00".repeat(33)).is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let digest = leaf_hash(b"serde");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));

        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn test_try_from_slice() {
        let digest = leaf_hash(b"slice");
        let bytes: &[u8] = digest.as_ref();
        assert_eq!(Digest::try_from(bytes).unwrap(), digest);
        assert!(Digest::try_from(&bytes[..31]).is_err());
    }
}
