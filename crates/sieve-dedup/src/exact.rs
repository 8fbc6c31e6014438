//! Whole-document exact deduplication.
//!
//! Documents are fingerprinted, routed by fingerprint, and collapsed per
//! shard: within a fingerprint group the earliest-ingested document
//! survives and every other member goes to the audit trail.

use crate::audit::{AuditTrail, ShardReport, Stage, StageReport};
use crate::document::{DocId, Document, ShardId};
use crate::shard::ShardRouter;
use rayon::prelude::*;
use sieve_core::{FingerprintAlgorithm, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Result of the exact stage.
#[derive(Debug, Clone)]
pub struct ExactOutcome {
    /// Survivors in ingestion order.
    pub documents: Vec<Document>,
    /// One entry per removed document.
    pub audit: AuditTrail,
    /// Document counts for the stage.
    pub report: StageReport,
}

/// One shard's share of the exact stage.
#[derive(Debug, Clone)]
pub struct ExactShard {
    /// Survivors tagged with their global position.
    pub survivors: Vec<(usize, Document)>,
    /// Removals in this shard.
    pub audit: AuditTrail,
    pub report: ShardReport,
    /// Fingerprint groups with more than one member.
    pub duplicate_groups: usize,
}

/// Exact duplicate resolver.
#[derive(Debug, Clone, Copy)]
pub struct ExactResolver {
    router: ShardRouter,
    algorithm: FingerprintAlgorithm,
}

impl ExactResolver {
    /// Create a resolver; fails on a zero shard count.
    pub fn new(shard_count: usize, algorithm: FingerprintAlgorithm) -> Result<Self> {
        Ok(Self {
            router: ShardRouter::new(shard_count)?,
            algorithm,
        })
    }

    /// Fill in `fingerprint` and `shard` on every document.
    #[must_use]
    pub fn fingerprint(&self, mut docs: Vec<Document>) -> Vec<Document> {
        docs.par_iter_mut().for_each(|doc| {
            let fp = self.algorithm.fingerprint(&doc.text);
            doc.fingerprint = Some(fp);
            doc.shard = Some(self.router.route(fp.as_u128()));
        });
        docs
    }

    /// Collapse one shard.
    ///
    /// `docs` must be in ingestion order; positions are carried through so
    /// shards can be merged back into that order.
    #[must_use]
    pub fn resolve_shard(&self, shard: ShardId, docs: Vec<(usize, Document)>) -> ExactShard {
        let before = docs.len();
        let mut first_seen: HashMap<_, DocId> = HashMap::with_capacity(before);
        let mut groups_with_dups: HashSet<DocId> = HashSet::new();
        let mut survivors = Vec::with_capacity(before);
        let mut audit = AuditTrail::new();

        for (position, doc) in docs {
            let fp = doc
                .fingerprint
                .unwrap_or_else(|| self.algorithm.fingerprint(&doc.text));
            match first_seen.get(&fp) {
                Some(&survivor) => {
                    groups_with_dups.insert(survivor);
                    audit.record_document(doc, survivor);
                }
                None => {
                    first_seen.insert(fp, doc.id);
                    survivors.push((position, doc));
                }
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
            removed = report.removed(),
            "Exact shard resolved"
        );

        ExactShard {
            survivors,
            audit,
            report,
            duplicate_groups: groups_with_dups.len(),
        }
    }

    /// Run the exact stage over an ordered batch.
    #[must_use]
    pub fn resolve(&self, docs: Vec<Document>) -> ExactOutcome {
        let input = docs.len();
        let docs = self.fingerprint(docs);
        let shards = self.router.partition(docs, |_, doc| {
            doc.fingerprint.map_or(0, |fp| fp.as_u128())
        });

        let resolved: Vec<ExactShard> = shards
            .into_par_iter()
            .enumerate()
            .map(|(shard, docs)| self.resolve_shard(shard, docs))
            .collect();

        let mut survivors = Vec::with_capacity(input);
        let mut audit = AuditTrail::new();
        let mut shard_reports = Vec::with_capacity(resolved.len());
        let mut duplicate_clusters = 0;
        for shard in resolved {
            survivors.extend(shard.survivors);
            audit.merge(shard.audit);
            shard_reports.push(shard.report);
            duplicate_clusters += shard.duplicate_groups;
        }
        survivors.sort_unstable_by_key(|(position, _)| *position);

        let report = StageReport {
            stage: Stage::ExactDedup,
            input,
            surviving: survivors.len(),
            removed: audit.len(),
            duplicate_clusters,
            shards: shard_reports,
            cascaded_documents: Vec::new(),
            empty_documents: Vec::new(),
        };
        info!(
            input,
            surviving = report.surviving,
            removed = report.removed,
            "Exact deduplication complete"
        );

        ExactOutcome {
            documents: survivors.into_iter().map(|(_, doc)| doc).collect(),
            audit,
            report,
        }
    }
}
