//! # sieve-core
//!
//! Shared building blocks for the sieve deduplication engine.
//!
//! Provides:
//! - Exact-match document fingerprints (XXH3-128, BLAKE3)
//! - Seeded 64-bit hashing for MinHash permutations and LSH bands
//! - The error type for configuration violations

pub mod error;
pub mod hashing;

pub use error::{Result, SieveError};
pub use hashing::{
    exact_fingerprint, hash_with_seed, Blake3Hasher, Fingerprint, FingerprintAlgorithm,
    FingerprintHasher, XxHash3,
};
