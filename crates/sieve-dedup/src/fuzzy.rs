//! Paragraph-level near-duplicate removal.
//!
//! Per shard: build an LSH index over the paragraph signatures, then sweep
//! paragraphs in order. Each paragraph not yet visited becomes a cluster
//! seed; it and every not-yet-visited LSH candidate form one cluster, and
//! all members except the seed are removed. Only the seed is probed, so a
//! removed member's own candidates are not pulled in: clusters are not
//! closed under similarity.

use crate::audit::{AuditTrail, ShardReport};
use crate::cluster::UnionFind;
use crate::config::DedupConfig;
use crate::document::{DocId, Paragraph, ShardId};
use crate::lsh::LshIndex;
use crate::minhash::{MinHashSignature, MinHasher};
use crate::shard::{FuzzySharding, ShardRouter};
use rayon::prelude::*;
use sieve_core::Result;
use tracing::debug;

/// Result of resolving all shards.
#[derive(Debug, Clone)]
pub struct FuzzyResolution {
    /// Surviving paragraphs in global paragraph order.
    pub paragraphs: Vec<Paragraph>,
    /// Removals, merged in shard order.
    pub audit: AuditTrail,
    /// Per-shard paragraph counts.
    pub shards: Vec<ShardReport>,
    /// Clusters with more than one member, over all shards.
    pub duplicate_clusters: usize,
}

/// One shard's share of the fuzzy stage.
#[derive(Debug, Clone)]
pub struct FuzzyShard {
    /// Survivors tagged with their global position.
    pub survivors: Vec<(usize, Paragraph)>,
    /// Removals in sweep order.
    pub audit: AuditTrail,
    pub report: ShardReport,
    /// Clusters with more than one member.
    pub duplicate_clusters: usize,
}

/// Near-duplicate resolver.
#[derive(Debug, Clone)]
pub struct FuzzyResolver {
    hasher: MinHasher,
    threshold: f64,
    num_bands: usize,
    rows_per_band: usize,
    router: ShardRouter,
    sharding: FuzzySharding,
    verify: bool,
}

impl FuzzyResolver {
    /// Create a resolver from a validated configuration.
    pub fn new(config: &DedupConfig) -> Result<Self> {
        config.validate()?;

        let hasher = MinHasher::with_seed(config.num_permutations, config.seed)
            .with_ngram_size(config.ngram_size);
        let (num_bands, rows_per_band) =
            LshIndex::optimal_params(config.num_permutations, config.threshold);
        let shard_count = match config.fuzzy_sharding {
            FuzzySharding::Single => 1,
            FuzzySharding::RoundRobin | FuzzySharding::FirstBand => config.shard_count,
        };

        debug!(num_bands, rows_per_band, shard_count, "LSH layout");

        Ok(Self {
            hasher,
            threshold: config.threshold,
            num_bands,
            rows_per_band,
            router: ShardRouter::new(shard_count)?,
            sharding: config.fuzzy_sharding,
            verify: config.verify_candidates,
        })
    }

    /// The signature generator used by this resolver.
    #[must_use]
    pub fn hasher(&self) -> &MinHasher {
        &self.hasher
    }

    /// `(bands, rows_per_band)` of every index this resolver builds.
    #[must_use]
    pub fn band_layout(&self) -> (usize, usize) {
        (self.num_bands, self.rows_per_band)
    }

    /// Number of shards paragraphs are routed to.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.router.shard_count()
    }

    fn new_index(&self) -> Result<LshIndex> {
        LshIndex::new(
            self.hasher.num_permutations(),
            self.num_bands,
            self.rows_per_band,
        )
    }

    /// Compute missing signatures.
    #[must_use]
    pub fn sign(&self, mut paragraphs: Vec<Paragraph>) -> Vec<Paragraph> {
        paragraphs.par_iter_mut().for_each(|p| {
            if p.signature.is_none() {
                p.signature = Some(self.hasher.signature_from_text(&p.text));
            }
        });
        paragraphs
    }

    fn shard_key(&self, bands: &LshIndex, position: usize, paragraph: &Paragraph) -> u128 {
        match (self.sharding, &paragraph.signature) {
            (FuzzySharding::FirstBand, Some(sig)) => u128::from(bands.band_key(sig, 0)),
            _ => position as u128,
        }
    }

    /// Resolve one shard. `paragraphs` must be in global paragraph order.
    pub fn resolve_shard(
        &self,
        shard: ShardId,
        paragraphs: Vec<(usize, Paragraph)>,
    ) -> Result<FuzzyShard> {
        let before = paragraphs.len();
        let signatures: Vec<MinHashSignature> = paragraphs
            .iter()
            .map(|(_, p)| {
                p.signature
                    .clone()
                    .unwrap_or_else(|| self.hasher.signature_from_text(&p.text))
            })
            .collect();

        let mut index = self.new_index()?;
        for (local, sig) in signatures.iter().enumerate() {
            index.insert(local, sig)?;
        }

        let mut visited = vec![false; before];
        let mut clusters = UnionFind::new(before);
        for seed in 0..before {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;

            for candidate in index.query(&signatures[seed])? {
                if visited[candidate] {
                    continue;
                }
                if self.verify
                    && MinHasher::similarity(&signatures[seed], &signatures[candidate])?
                        < self.threshold
                {
                    continue;
                }
                visited[candidate] = true;
                clusters.union(seed, candidate);
            }
        }

        // Every earlier paragraph was visited before a seed is probed, so the
        // lowest member of each cluster is its seed.
        let duplicate_clusters = clusters.duplicate_clusters();
        let mut survivor_of: Vec<Option<usize>> = vec![None; before];
        for members in &duplicate_clusters {
            for &member in &members[1..] {
                survivor_of[member] = Some(members[0]);
            }
        }

        let keys: Vec<(DocId, usize)> = paragraphs
            .iter()
            .map(|(_, p)| (p.doc_id, p.paragraph_index))
            .collect();
        let mut survivors = Vec::with_capacity(before);
        let mut audit = AuditTrail::new();
        for (local, (position, paragraph)) in paragraphs.into_iter().enumerate() {
            match survivor_of[local] {
                Some(survivor) => {
                    let (doc, index) = keys[survivor];
                    audit.record_paragraph(paragraph, doc, index);
                }
                None => survivors.push((position, paragraph)),
            }
        }

        let report = ShardReport {
            shard,
            before,
            after: survivors.len(),
        };
        debug!(
            shard,
            before,
            after = report.after,
            clusters = duplicate_clusters.len(),
            "Fuzzy shard resolved"
        );

        Ok(FuzzyShard {
            survivors,
            audit,
            report,
            duplicate_clusters: duplicate_clusters.len(),
        })
    }

    /// Sign, route and resolve an ordered batch of paragraphs.
    ///
    /// Signature lengths are checked for the whole batch before any shard
    /// is resolved.
    pub fn resolve(&self, paragraphs: Vec<Paragraph>) -> Result<FuzzyResolution> {
        let paragraphs = self.sign(paragraphs);
        for sig in paragraphs.iter().filter_map(|p| p.signature.as_ref()) {
            self.hasher.check(sig)?;
        }

        let bands = self.new_index()?;
        let mut shards = self
            .router
            .partition(paragraphs, |position, p| self.shard_key(&bands, position, p));
        for (shard, items) in shards.iter_mut().enumerate() {
            for (_, p) in items.iter_mut() {
                p.shard = Some(shard);
            }
        }

        let resolved = shards
            .into_par_iter()
            .enumerate()
            .map(|(shard, items)| self.resolve_shard(shard, items))
            .collect::<Result<Vec<_>>>()?;

        let mut survivors = Vec::new();
        let mut audit = AuditTrail::new();
        let mut reports = Vec::with_capacity(resolved.len());
        let mut duplicate_clusters = 0;
        for shard in resolved {
            survivors.extend(shard.survivors);
            audit.merge(shard.audit);
            reports.push(shard.report);
            duplicate_clusters += shard.duplicate_clusters;
        }
        survivors.sort_unstable_by_key(|(position, _)| *position);

        Ok(FuzzyResolution {
            paragraphs: survivors.into_iter().map(|(_, p)| p).collect(),
            audit,
            shards: reports,
            duplicate_clusters,
        })
    }
}
