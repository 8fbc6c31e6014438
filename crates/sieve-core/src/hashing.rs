//! Hashing functions.
//!
//! Two kinds of hashing feed the deduplication engine:
//! - 128-bit [`Fingerprint`]s that identify byte-identical documents, and
//! - seeded 64-bit hashes ([`hash_with_seed`]) used for MinHash permutations
//!   and LSH band keys.

use crate::error::SieveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exact-match digest of a document's text.
///
/// 128 bits keeps accidental collisions out of reach at corpus scale.
/// Serialized as 32 lowercase hex characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Wrap a raw digest.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Raw digest value, used as the routing key for exact sharding.
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Big-endian digest bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    fn from_digest_prefix(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes[..16]);
        Self(u128::from_be_bytes(buf))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for Fingerprint {
    type Err = SieveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| SieveError::InvalidFingerprint(e.to_string()))?;
        if bytes.len() != 16 {
            return Err(SieveError::InvalidFingerprint(format!(
                "expected 16 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self::from_digest_prefix(&bytes))
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_string()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = SieveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Trait for fingerprint functions.
pub trait FingerprintHasher: Send + Sync {
    /// Digest raw bytes.
    fn fingerprint(&self, data: &[u8]) -> Fingerprint;

    /// Digest a text's UTF-8 bytes.
    fn fingerprint_text(&self, text: &str) -> Fingerprint {
        self.fingerprint(text.as_bytes())
    }
}

/// XXHash3 hasher - extremely fast, non-cryptographic.
pub struct XxHash3;

impl XxHash3 {
    /// Create a new XXHash3 hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for XxHash3 {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintHasher for XxHash3 {
    fn fingerprint(&self, data: &[u8]) -> Fingerprint {
        Fingerprint(xxhash_rust::xxh3::xxh3_128(data))
    }
}

/// Blake3 hasher - cryptographically secure, still fast.
///
/// The 256-bit digest is truncated to its first 128 bits.
pub struct Blake3Hasher;

impl Blake3Hasher {
    /// Create a new Blake3 hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintHasher for Blake3Hasher {
    fn fingerprint(&self, data: &[u8]) -> Fingerprint {
        Fingerprint::from_digest_prefix(blake3::hash(data).as_bytes())
    }
}

/// Selectable fingerprint algorithm for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// XXH3-128.
    #[default]
    Xxh3,
    /// BLAKE3, truncated to 128 bits.
    Blake3,
}

impl FingerprintAlgorithm {
    /// Digest a text with this algorithm.
    #[must_use]
    pub fn fingerprint(&self, text: &str) -> Fingerprint {
        match self {
            Self::Xxh3 => XxHash3.fingerprint_text(text),
            Self::Blake3 => Blake3Hasher.fingerprint_text(text),
        }
    }
}

/// Fingerprint a text with the default algorithm (XXH3-128).
///
/// No normalization is applied; upstream cleaning owns that.
#[must_use]
pub fn exact_fingerprint(text: &str) -> Fingerprint {
    FingerprintAlgorithm::default().fingerprint(text)
}

/// Hash with seed for MinHash-style algorithms.
#[inline]
pub fn hash_with_seed(data: &[u8], seed: u64) -> u64 {
    xxhash_rust::xxh3::xxh3_64_with_seed(data, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xxhash3_deterministic() {
        let hasher = XxHash3::new();
        let data = b"hello world";

        assert_eq!(hasher.fingerprint(data), hasher.fingerprint(data));
    }

    #[test]
    fn test_blake3_deterministic() {
        let hasher = Blake3Hasher::new();
        let data = b"hello world";

        assert_eq!(hasher.fingerprint(data), hasher.fingerprint(data));
    }

    #[test]
    fn test_algorithms_disagree() {
        let text = "Hello world. This is a test.";
        assert_ne!(
            FingerprintAlgorithm::Xxh3.fingerprint(text),
            FingerprintAlgorithm::Blake3.fingerprint(text)
        );
    }

    #[test]
    fn test_exact_fingerprint_distinguishes_texts() {
        let a = exact_fingerprint("Hello world. This is a test.");
        let b = exact_fingerprint("Hello world. This is a test!");
        assert_ne!(a, b);
        assert_eq!(a, exact_fingerprint("Hello world. This is a test."));
    }

    #[test]
    fn test_empty_text_has_fingerprint() {
        assert_eq!(exact_fingerprint(""), exact_fingerprint(""));
        assert_ne!(exact_fingerprint(""), exact_fingerprint(" "));
    }

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let fp = exact_fingerprint("some document");
        let hex = fp.to_string();
        assert_eq!(hex.len(), 32);
        assert_eq!(hex.parse::<Fingerprint>().unwrap(), fp);
    }

    #[test]
    fn test_fingerprint_parse_rejects_wrong_length() {
        assert!(matches!(
            "abcd".parse::<Fingerprint>(),
            Err(SieveError::InvalidFingerprint(_))
        ));
        assert!("zz".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn test_fingerprint_serializes_as_hex() {
        let fp = Fingerprint::from_u128(0xff);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, "\"000000000000000000000000000000ff\"");
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_hash_with_seed() {
        let data = b"hello";
        let h1 = hash_with_seed(data, 42);
        let h2 = hash_with_seed(data, 42);
        let h3 = hash_with_seed(data, 43);

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
