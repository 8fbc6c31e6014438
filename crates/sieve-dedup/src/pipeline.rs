//! The two-stage deduplication pipeline.
//!
//! ```text
//! documents ─▶ fingerprint + route ─▶ exact pass (per shard)
//!           ─▶ segment ─▶ sign + route ─▶ fuzzy pass (per shard)
//!           ─▶ reconstruct ─▶ cleaned documents
//! ```
//!
//! The configuration is validated when the [`Deduplicator`] is built, so a
//! bad configuration fails before any shard is touched.

use crate::audit::{AuditTrail, Stage, StageReport};
use crate::config::DedupConfig;
use crate::document::{CleanedDocument, DocId, Document};
use crate::exact::{ExactOutcome, ExactResolver};
use crate::fuzzy::FuzzyResolver;
use crate::reconstruct::{missing_documents, reconstruct};
use crate::segment::segment;
use serde::{Deserialize, Serialize};
use sieve_core::{Result, SieveError};
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

/// Result of the fuzzy stage.
#[derive(Debug, Clone)]
pub struct FuzzyOutcome {
    /// Reconstructed documents in input order.
    pub documents: Vec<CleanedDocument>,
    /// One entry per removed paragraph.
    pub audit: AuditTrail,
    /// Paragraph counts for the stage.
    pub report: StageReport,
}

/// Summary of a full run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupStats {
    /// Documents handed to the run.
    pub input_documents: usize,
    /// Documents left after reconstruction.
    pub output_documents: usize,
    /// Documents removed as exact duplicates.
    pub exact_removed: usize,
    /// Paragraphs removed as near-duplicates.
    pub fuzzy_removed_paragraphs: usize,
    /// Documents that lost every paragraph.
    pub cascaded_documents: usize,
    /// Documents that had no paragraph to begin with.
    pub empty_documents: usize,
    /// Wall-clock time for both stages.
    pub processing_time_secs: f64,
}

/// Output of a full run.
#[derive(Debug, Clone)]
pub struct DedupOutput {
    /// Cleaned documents in input order.
    pub documents: Vec<CleanedDocument>,
    /// Exact-stage entries followed by fuzzy-stage entries.
    pub audit: AuditTrail,
    /// One report per stage, in execution order.
    pub reports: Vec<StageReport>,
    /// Run summary.
    pub stats: DedupStats,
}

/// Exact + fuzzy deduplicator.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    config: DedupConfig,
    exact: ExactResolver,
    fuzzy: FuzzyResolver,
}

impl Deduplicator {
    /// Build a deduplicator, rejecting invalid configurations.
    pub fn new(config: DedupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            exact: ExactResolver::new(config.shard_count, config.fingerprint)?,
            fuzzy: FuzzyResolver::new(&config)?,
            config,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// The fuzzy resolver, for callers that segment themselves.
    #[must_use]
    pub fn fuzzy_resolver(&self) -> &FuzzyResolver {
        &self.fuzzy
    }

    /// Remove byte-identical documents, keeping the first of each group.
    #[must_use]
    pub fn exact_dedup(&self, docs: Vec<Document>) -> ExactOutcome {
        self.exact.resolve(docs)
    }

    /// Remove near-duplicate paragraphs and rebuild the documents.
    ///
    /// Meant for exact-stage survivors, but accepts any batch whose ids are
    /// unique: paragraphs are regrouped by id.
    pub fn fuzzy_dedup(&self, docs: Vec<Document>) -> Result<FuzzyOutcome> {
        check_unique_ids(&docs)?;
        let doc_ids: Vec<_> = docs.iter().map(|d| d.id).collect();
        let segmentation = segment(&docs);
        drop(docs);

        let input = segmentation.paragraphs.len();
        let resolution = self.fuzzy.resolve(segmentation.paragraphs)?;
        let surviving = resolution.paragraphs.len();
        let documents = reconstruct(resolution.paragraphs);

        let empty: HashSet<_> = segmentation.empty_documents.iter().copied().collect();
        let cascaded: Vec<_> = missing_documents(&doc_ids, &documents)
            .into_iter()
            .filter(|id| !empty.contains(id))
            .collect();

        let report = StageReport {
            stage: Stage::FuzzyDedup,
            input,
            surviving,
            removed: resolution.audit.len(),
            duplicate_clusters: resolution.duplicate_clusters,
            shards: resolution.shards,
            cascaded_documents: cascaded,
            empty_documents: segmentation.empty_documents,
        };
        info!(
            paragraphs = input,
            surviving,
            removed = report.removed,
            cascaded_documents = report.cascaded_documents.len(),
            empty_documents = report.empty_documents.len(),
            "Fuzzy deduplication complete"
        );

        Ok(FuzzyOutcome {
            documents,
            audit: resolution.audit,
            report,
        })
    }

    /// Run both stages.
    ///
    /// Fails before either stage runs if two documents share an id.
    pub fn run(&self, docs: Vec<Document>) -> Result<DedupOutput> {
        check_unique_ids(&docs)?;
        let start = Instant::now();
        let input_documents = docs.len();

        let exact = self.exact_dedup(docs);
        let fuzzy = self.fuzzy_dedup(exact.documents)?;

        let mut audit = exact.audit;
        audit.merge(fuzzy.audit);

        let stats = DedupStats {
            input_documents,
            output_documents: fuzzy.documents.len(),
            exact_removed: exact.report.removed,
            fuzzy_removed_paragraphs: fuzzy.report.removed,
            cascaded_documents: fuzzy.report.cascaded_documents.len(),
            empty_documents: fuzzy.report.empty_documents.len(),
            processing_time_secs: start.elapsed().as_secs_f64(),
        };

        Ok(DedupOutput {
            documents: fuzzy.documents,
            audit,
            reports: vec![exact.report, fuzzy.report],
            stats,
        })
    }
}

/// Reconstruction regroups paragraphs by id, so ids must not repeat.
fn check_unique_ids(docs: &[Document]) -> Result<()> {
    let mut seen: HashSet<DocId> = HashSet::with_capacity(docs.len());
    for doc in docs {
        if !seen.insert(doc.id) {
            return Err(SieveError::DuplicateId(doc.id));
        }
    }
    Ok(())
}
