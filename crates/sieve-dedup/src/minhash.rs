//! MinHash signature generation for paragraph similarity.
//!
//! MinHash is a locality-sensitive hashing technique that approximates
//! the Jaccard similarity between sets. Here the set is a paragraph's
//! lower-cased words (or word n-grams when configured).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sieve_core::{hash_with_seed, Result, SieveError};
use std::collections::HashSet;

/// Default number of permutations for MinHash signatures.
pub const DEFAULT_NUM_PERMUTATIONS: usize = 128;

/// Default shingle size: single words.
pub const DEFAULT_NGRAM_SIZE: usize = 1;

/// Default seed for the permutation family.
pub const DEFAULT_SEED: u64 = 42;

/// MinHash signature - a compact representation of a paragraph's token set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinHashSignature {
    /// The minimum hash values for each permutation.
    pub values: Vec<u64>,
}

impl MinHashSignature {
    /// Create a new signature with the given values.
    #[must_use]
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    /// Get the number of permutations in this signature.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the signature is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True for the signature of an empty token set.
    ///
    /// Degenerate signatures are identical to each other and therefore
    /// cluster together. That is expected behaviour.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.values.iter().all(|&v| v == u64::MAX)
    }
}

/// MinHash signature generator.
///
/// Uses multiple hash functions (simulated via seeds) to generate
/// compact signatures that preserve Jaccard similarity. The permutation
/// count and seed must stay fixed across a run for signatures to be
/// comparable.
#[derive(Debug, Clone)]
pub struct MinHasher {
    num_permutations: usize,
    seeds: Vec<u64>,
    ngram_size: usize,
}

impl MinHasher {
    /// Create a new MinHasher with the specified number of permutations.
    ///
    /// Uses a fixed seed for reproducibility.
    #[must_use]
    pub fn new(num_permutations: usize) -> Self {
        Self::with_seed(num_permutations, DEFAULT_SEED)
    }

    /// Create a new MinHasher with a specific random seed.
    #[must_use]
    pub fn with_seed(num_permutations: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = (0..num_permutations).map(|_| rng.gen()).collect();

        Self {
            num_permutations,
            seeds,
            ngram_size: DEFAULT_NGRAM_SIZE,
        }
    }

    /// Set the n-gram size for shingling. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_ngram_size(mut self, ngram_size: usize) -> Self {
        self.ngram_size = ngram_size.max(1);
        self
    }

    /// Get the number of permutations.
    #[must_use]
    pub fn num_permutations(&self) -> usize {
        self.num_permutations
    }

    /// Get the n-gram size.
    #[must_use]
    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    /// Generate a MinHash signature from a set of token hashes.
    ///
    /// Each token hash is hashed with each seed, and the minimum
    /// hash value is kept for each permutation.
    #[must_use]
    pub fn signature(&self, tokens: &HashSet<u64>) -> MinHashSignature {
        let mut min_hashes = vec![u64::MAX; self.num_permutations];

        for &token in tokens {
            let token_bytes = token.to_le_bytes();
            for (slot, &seed) in min_hashes.iter_mut().zip(&self.seeds) {
                *slot = (*slot).min(hash_with_seed(&token_bytes, seed));
            }
        }

        MinHashSignature::new(min_hashes)
    }

    /// Generate a MinHash signature directly from text.
    #[must_use]
    pub fn signature_from_text(&self, text: &str) -> MinHashSignature {
        let tokens = self.tokenize(text);
        self.signature(&tokens)
    }

    /// Tokenize text into hashed, lower-cased words or word n-grams.
    ///
    /// With an n-gram size above 1, texts shorter than `n` words become a
    /// single shingle.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> HashSet<u64> {
        let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();

        if words.is_empty() {
            return HashSet::new();
        }

        if words.len() < self.ngram_size {
            let shingle = words.join(" ");
            return HashSet::from([hash_with_seed(shingle.as_bytes(), 0)]);
        }

        words
            .windows(self.ngram_size)
            .map(|window| hash_with_seed(window.join(" ").as_bytes(), 0))
            .collect()
    }

    /// Check that a signature was produced with this hasher's permutation count.
    pub fn check(&self, sig: &MinHashSignature) -> Result<()> {
        if sig.len() == self.num_permutations {
            Ok(())
        } else {
            Err(SieveError::SignatureMismatch {
                expected: self.num_permutations,
                found: sig.len(),
            })
        }
    }

    /// Estimate Jaccard similarity from two MinHash signatures.
    ///
    /// The similarity is approximated by the fraction of hash values
    /// that match between the two signatures.
    pub fn similarity(sig1: &MinHashSignature, sig2: &MinHashSignature) -> Result<f64> {
        if sig1.len() != sig2.len() {
            return Err(SieveError::SignatureMismatch {
                expected: sig1.len(),
                found: sig2.len(),
            });
        }

        if sig1.is_empty() {
            return Ok(0.0);
        }

        let matches = sig1
            .values
            .iter()
            .zip(&sig2.values)
            .filter(|(a, b)| a == b)
            .count();

        Ok(matches as f64 / sig1.len() as f64)
    }
}

impl Default for MinHasher {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_PERMUTATIONS)
    }
}
