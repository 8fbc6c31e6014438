//! Locality-Sensitive Hashing (LSH) for candidate lookup.
//!
//! Signatures are cut into bands of rows; two signatures are candidates
//! when they agree on every row of at least one band. An index is built
//! per shard and owned by that shard's resolution call.

use crate::minhash::MinHashSignature;
use sieve_core::{hash_with_seed, Result, SieveError};
use std::collections::HashMap;

/// Shard-local paragraph position.
pub type ItemId = usize;

/// Integration steps for the false positive/negative areas.
const INTEGRATION_STEPS: usize = 200;

/// Banded LSH index.
pub struct LshIndex {
    num_permutations: usize,
    num_bands: usize,
    rows_per_band: usize,
    /// Buckets for each band: band_id -> band hash -> item ids.
    buckets: Vec<HashMap<u64, Vec<ItemId>>>,
    len: usize,
}

impl LshIndex {
    /// Create a new LSH index with an explicit band layout.
    ///
    /// `num_bands * rows_per_band` must not exceed `num_permutations`;
    /// trailing signature slots beyond the bands are ignored.
    pub fn new(num_permutations: usize, num_bands: usize, rows_per_band: usize) -> Result<Self> {
        if num_bands == 0 || rows_per_band == 0 {
            return Err(SieveError::config("LSH bands and rows must be > 0"));
        }
        if num_bands * rows_per_band > num_permutations {
            return Err(SieveError::config(format!(
                "{num_bands} bands x {rows_per_band} rows exceeds {num_permutations} permutations"
            )));
        }

        Ok(Self {
            num_permutations,
            num_bands,
            rows_per_band,
            buckets: (0..num_bands).map(|_| HashMap::new()).collect(),
            len: 0,
        })
    }

    /// Create an index tuned for a similarity threshold.
    pub fn with_threshold(num_permutations: usize, threshold: f64) -> Result<Self> {
        let (num_bands, rows_per_band) = Self::optimal_params(num_permutations, threshold);
        Self::new(num_permutations, num_bands, rows_per_band)
    }

    /// Pick `(bands, rows)` for a threshold.
    ///
    /// Minimises the equally weighted sum of the false-positive area
    /// (below `t`) and the false-negative area (above `t`) of the
    /// candidate curve `P(s) = 1 - (1 - s^r)^b`, over all `b * r <= n`.
    #[must_use]
    pub fn optimal_params(n: usize, t: f64) -> (usize, usize) {
        let mut best = (1, n.max(1));
        let mut best_err = f64::MAX;

        for b in 1..=n {
            for r in 1..=n / b {
                let candidate = |s: f64| 1.0 - (1.0 - s.powi(r as i32)).powi(b as i32);
                let fp = integrate(candidate, 0.0, t);
                let fn_ = integrate(|s| 1.0 - candidate(s), t, 1.0);
                let err = 0.5 * fp + 0.5 * fn_;
                if err < best_err {
                    best = (b, r);
                    best_err = err;
                }
            }
        }

        best
    }

    /// Get the number of bands.
    #[must_use]
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Get the number of rows per band.
    #[must_use]
    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    /// Number of inserted items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a signature under `id`.
    pub fn insert(&mut self, id: ItemId, signature: &MinHashSignature) -> Result<()> {
        self.check(signature)?;

        for band in 0..self.num_bands {
            let key = self.band_key(signature, band);
            self.buckets[band].entry(key).or_default().push(id);
        }
        self.len += 1;

        Ok(())
    }

    /// All ids sharing at least one full band with `signature`, ascending.
    ///
    /// Includes the queried item itself when it was inserted.
    pub fn query(&self, signature: &MinHashSignature) -> Result<Vec<ItemId>> {
        self.check(signature)?;

        let mut found: Vec<ItemId> = (0..self.num_bands)
            .filter_map(|band| self.buckets[band].get(&self.band_key(signature, band)))
            .flatten()
            .copied()
            .collect();
        found.sort_unstable();
        found.dedup();

        Ok(found)
    }

    /// Hash of one band of a signature.
    #[must_use]
    pub fn band_key(&self, signature: &MinHashSignature, band: usize) -> u64 {
        let start = band * self.rows_per_band;
        hash_band(&signature.values[start..start + self.rows_per_band])
    }

    fn check(&self, signature: &MinHashSignature) -> Result<()> {
        if signature.len() == self.num_permutations {
            Ok(())
        } else {
            Err(SieveError::SignatureMismatch {
                expected: self.num_permutations,
                found: signature.len(),
            })
        }
    }
}

/// Hash a band of signature values to a single u64.
fn hash_band(values: &[u64]) -> u64 {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    hash_with_seed(&bytes, 0)
}

/// Midpoint rule over `[a, b]`.
fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    let h = (b - a) / INTEGRATION_STEPS as f64;
    (0..INTEGRATION_STEPS)
        .map(|i| f(a + (i as f64 + 0.5) * h))
        .sum::<f64>()
        * h
}
