//! Deterministic assignment of records to independent partitions.
//!
//! Exact dedup routes by fingerprint, so byte-identical documents always
//! share a shard. Fuzzy dedup routes paragraphs by position by default,
//! which gives no locality for similar paragraphs: two near-duplicates
//! routed to different shards are never compared, so recall drops as the
//! shard count grows. [`FuzzySharding::Single`] and
//! [`FuzzySharding::FirstBand`] trade throughput back for recall.

use crate::document::ShardId;
use serde::{Deserialize, Serialize};
use sieve_core::{Result, SieveError};
use std::num::NonZeroUsize;

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: usize = 8;

/// Route a key to a shard: `key mod shard_count`.
///
/// Fails only when `shard_count` is zero.
pub fn route(key: u128, shard_count: usize) -> Result<ShardId> {
    ShardRouter::new(shard_count).map(|router| router.route(key))
}

/// Routing key strategy for the fuzzy (paragraph) stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FuzzySharding {
    /// Global paragraph position modulo the shard count.
    ///
    /// Near-duplicates routed to different shards are never compared, so
    /// recall falls roughly by a factor of the shard count.
    #[default]
    RoundRobin,
    /// Every paragraph in shard 0. Full recall, no parallelism.
    Single,
    /// Hash of the signature's first LSH band. Paragraphs agreeing on that
    /// band co-locate; pairs that only match on later bands may still split.
    FirstBand,
}

/// Stateless shard router for a fixed shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: NonZeroUsize,
}

impl ShardRouter {
    /// Create a router. A zero shard count is a configuration error.
    pub fn new(shard_count: usize) -> Result<Self> {
        NonZeroUsize::new(shard_count)
            .map(|shard_count| Self { shard_count })
            .ok_or_else(|| SieveError::config("shard_count must be > 0"))
    }

    /// Number of shards.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shard_count.get()
    }

    /// Route a key.
    #[must_use]
    pub fn route(&self, key: u128) -> ShardId {
        (key % self.shard_count.get() as u128) as ShardId
    }

    /// Split an ordered batch into per-shard buckets.
    ///
    /// Each item is tagged with its global position. Relative order inside a
    /// bucket follows input order, so "first in shard" is also "first
    /// ingested". `key` receives the item's position and the item.
    pub fn partition<T, F>(&self, items: Vec<T>, mut key: F) -> Vec<Vec<(usize, T)>>
    where
        F: FnMut(usize, &T) -> u128,
    {
        let mut shards: Vec<Vec<(usize, T)>> =
            (0..self.shard_count()).map(|_| Vec::new()).collect();

        for (position, item) in items.into_iter().enumerate() {
            let shard = self.route(key(position, &item));
            shards[shard].push((position, item));
        }

        shards
    }
}
