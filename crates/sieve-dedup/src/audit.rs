//! Append-only ledger of removed records.
//!
//! Each resolver shard accumulates its own [`AuditTrail`]; trails are merged
//! in shard order once every shard has finished. The ledger is handed to
//! reporting and never read back into the pipeline.

use crate::document::{DocId, Document, Paragraph, ShardId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage that removed a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Whole-document exact dedup.
    ExactDedup,
    /// Paragraph-level near-duplicate dedup.
    FuzzyDedup,
}

impl Stage {
    /// Stable name used in reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExactDedup => "exact_dedup",
            Self::FuzzyDedup => "fuzzy_dedup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record was removed, and which record it lost to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RemovalReason {
    /// Same fingerprint as an earlier document.
    ExactDuplicate {
        /// Surviving document.
        survivor: DocId,
    },
    /// LSH candidate of an earlier paragraph in the same shard.
    FuzzyDuplicate {
        /// Surviving paragraph's document.
        survivor_doc: DocId,
        /// Surviving paragraph's index within its document.
        survivor_paragraph: usize,
    },
}

impl RemovalReason {
    /// Stage implied by the reason.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::ExactDuplicate { .. } => Stage::ExactDedup,
            Self::FuzzyDuplicate { .. } => Stage::FuzzyDedup,
        }
    }

    /// Reason name used in reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExactDuplicate { .. } => "exact_duplicate",
            Self::FuzzyDuplicate { .. } => "fuzzy_duplicate",
        }
    }
}

/// The removed record itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum RemovedRecord {
    /// A whole document, from the exact stage.
    Document(Document),
    /// A single paragraph, from the fuzzy stage.
    Paragraph(Paragraph),
}

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// What was removed.
    #[serde(flatten)]
    pub record: RemovedRecord,
    /// Stage that removed it.
    pub stage: Stage,
    /// Why, and what survived in its place.
    #[serde(flatten)]
    pub reason: RemovalReason,
}

impl AuditEntry {
    /// Create an entry; the stage follows from the reason.
    #[must_use]
    pub fn new(record: RemovedRecord, reason: RemovalReason) -> Self {
        Self {
            record,
            stage: reason.stage(),
            reason,
        }
    }
}

/// Append-only sequence of [`AuditEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    /// Create an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document removed as an exact duplicate of `survivor`.
    pub fn record_document(&mut self, doc: Document, survivor: DocId) {
        self.entries.push(AuditEntry::new(
            RemovedRecord::Document(doc),
            RemovalReason::ExactDuplicate { survivor },
        ));
    }

    /// Record a paragraph removed as a near-duplicate of the paragraph
    /// `survivor_paragraph` of document `survivor_doc`.
    pub fn record_paragraph(
        &mut self,
        paragraph: Paragraph,
        survivor_doc: DocId,
        survivor_paragraph: usize,
    ) {
        self.entries.push(AuditEntry::new(
            RemovedRecord::Paragraph(paragraph),
            RemovalReason::FuzzyDuplicate {
                survivor_doc,
                survivor_paragraph,
            },
        ));
    }

    /// Append another trail (typically one shard's) to this one.
    pub fn merge(&mut self, other: AuditTrail) {
        self.entries.extend(other.entries);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries removed by `stage`.
    #[must_use]
    pub fn count(&self, stage: Stage) -> usize {
        self.entries.iter().filter(|e| e.stage == stage).count()
    }

    /// Iterate over entries in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, AuditEntry> {
        self.entries.iter()
    }

    /// Entries removed by `stage`.
    pub fn by_stage(&self, stage: Stage) -> impl Iterator<Item = &AuditEntry> + '_ {
        self.entries.iter().filter(move |e| e.stage == stage)
    }
}

impl IntoIterator for AuditTrail {
    type Item = AuditEntry;
    type IntoIter = std::vec::IntoIter<AuditEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a AuditTrail {
    type Item = &'a AuditEntry;
    type IntoIter = std::slice::Iter<'a, AuditEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Per-shard record counts for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardReport {
    pub shard: ShardId,
    /// Records routed to the shard.
    pub before: usize,
    /// Records the shard kept.
    pub after: usize,
}

impl ShardReport {
    /// Records removed in this shard.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Record counts for one stage.
///
/// For the fuzzy stage the counts are paragraphs; documents that lost every
/// paragraph are listed in `cascaded_documents`, and documents that never
/// had a paragraph in `empty_documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    /// Records entering the stage.
    pub input: usize,
    /// Records leaving the stage.
    pub surviving: usize,
    /// Records written to the audit trail.
    pub removed: usize,
    /// Groups with more than one member.
    pub duplicate_clusters: usize,
    /// Per-shard counts, in shard order.
    pub shards: Vec<ShardReport>,
    /// Documents that lost every paragraph.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cascaded_documents: Vec<DocId>,
    /// Documents that produced no paragraph.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub empty_documents: Vec<DocId>,
}

impl StageReport {
    /// `surviving + removed == input`.
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.surviving + self.removed == self.input
    }

    /// Fraction of input records removed.
    #[must_use]
    pub fn removal_ratio(&self) -> f64 {
        if self.input == 0 {
            0.0
        } else {
            self.removed as f64 / self.input as f64
        }
    }
}
