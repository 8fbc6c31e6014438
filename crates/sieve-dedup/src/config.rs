//! Run-wide tunables.

use crate::minhash::{DEFAULT_NGRAM_SIZE, DEFAULT_NUM_PERMUTATIONS, DEFAULT_SEED};
use crate::shard::{FuzzySharding, DEFAULT_SHARD_COUNT};
use serde::{Deserialize, Serialize};
use sieve_core::{FingerprintAlgorithm, Result, SieveError};

/// Default similarity threshold for near-duplicate paragraphs.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Configuration for a deduplication run.
///
/// Permutation count, seed and n-gram size must stay fixed for a whole run
/// so that signatures remain comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Number of partitions for both stages.
    pub shard_count: usize,
    /// Jaccard threshold used to lay out the LSH bands.
    pub threshold: f64,
    /// Number of MinHash permutations.
    pub num_permutations: usize,
    /// Word n-gram size for shingling (1 = single words).
    pub ngram_size: usize,
    /// Seed for the MinHash permutation family.
    pub seed: u64,
    /// Exact fingerprint algorithm.
    pub fingerprint: FingerprintAlgorithm,
    /// Routing key for paragraphs.
    pub fuzzy_sharding: FuzzySharding,
    /// Drop LSH candidates whose estimated similarity is below `threshold`.
    pub verify_candidates: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            threshold: DEFAULT_THRESHOLD,
            num_permutations: DEFAULT_NUM_PERMUTATIONS,
            ngram_size: DEFAULT_NGRAM_SIZE,
            seed: DEFAULT_SEED,
            fingerprint: FingerprintAlgorithm::default(),
            fuzzy_sharding: FuzzySharding::default(),
            verify_candidates: false,
        }
    }
}

impl DedupConfig {
    /// Set the shard count.
    #[must_use]
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Set the similarity threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the number of permutations.
    #[must_use]
    pub fn with_permutations(mut self, num_permutations: usize) -> Self {
        self.num_permutations = num_permutations;
        self
    }

    /// Set the n-gram size.
    #[must_use]
    pub fn with_ngram_size(mut self, ngram_size: usize) -> Self {
        self.ngram_size = ngram_size;
        self
    }

    /// Set the MinHash seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the fingerprint algorithm.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: FingerprintAlgorithm) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Set the fuzzy sharding strategy.
    #[must_use]
    pub fn with_fuzzy_sharding(mut self, fuzzy_sharding: FuzzySharding) -> Self {
        self.fuzzy_sharding = fuzzy_sharding;
        self
    }

    /// Enable or disable candidate verification.
    #[must_use]
    pub fn with_verify_candidates(mut self, verify: bool) -> Self {
        self.verify_candidates = verify;
        self
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(SieveError::config("shard_count must be > 0"));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(SieveError::config(format!(
                "threshold must be in (0.0, 1.0], got {}",
                self.threshold
            )));
        }
        if self.num_permutations == 0 {
            return Err(SieveError::config("num_permutations must be > 0"));
        }
        if self.ngram_size == 0 {
            return Err(SieveError::config("ngram_size must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DedupConfig::default();
        assert_eq!(config.shard_count, 8);
        assert!((config.threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.num_permutations, 128);
        assert_eq!(config.fuzzy_sharding, FuzzySharding::RoundRobin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let bad = [
            DedupConfig::default().with_shard_count(0),
            DedupConfig::default().with_threshold(0.0),
            DedupConfig::default().with_threshold(1.5),
            DedupConfig::default().with_threshold(f64::NAN),
            DedupConfig::default().with_permutations(0),
            DedupConfig::default().with_ngram_size(0),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SieveError::Config(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DedupConfig =
            serde_json::from_str(r#"{"shard_count": 2, "fuzzy_sharding": "single"}"#).unwrap();
        assert_eq!(config.shard_count, 2);
        assert_eq!(config.fuzzy_sharding, FuzzySharding::Single);
        assert_eq!(config.num_permutations, 128);
    }
}
