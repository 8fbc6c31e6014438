//! Record types flowing through the deduplication stages.
//!
//! Every stage consumes one explicit record set and produces a new one;
//! identifiers are assigned once at creation and never recomputed.

use crate::minhash::MinHashSignature;
use serde::{Deserialize, Serialize};
use sieve_core::Fingerprint;

/// Document identifier, stable for the duration of a run.
pub type DocId = u64;

/// Logical partition identifier in `[0, shard_count)`.
pub type ShardId = usize;

/// A whole document as ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Positional or externally supplied identifier.
    pub id: DocId,
    /// Document text content.
    pub text: String,
    /// Source URL carried through to the cleaned output.
    #[serde(default)]
    pub url: String,
    /// Exact-match digest of `text`, set by the exact stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    /// Partition derived from `fingerprint`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<ShardId>,
}

impl Document {
    /// Create a new document.
    #[must_use]
    pub fn new(id: DocId, text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            url: url.into(),
            fingerprint: None,
            shard: None,
        }
    }

    /// Build documents from texts, assigning positional ids.
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Self::new(i as DocId, text, ""))
            .collect()
    }
}

/// One paragraph of a surviving document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Parent document. Used for regrouping only.
    pub doc_id: DocId,
    /// Dense 0-based position among the document's retained paragraphs.
    pub paragraph_index: usize,
    /// Trimmed paragraph text.
    pub text: String,
    /// Parent document's URL.
    #[serde(default)]
    pub url: String,
    /// MinHash signature, set before fuzzy sharding.
    #[serde(skip)]
    pub signature: Option<MinHashSignature>,
    /// Partition assigned for the fuzzy stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<ShardId>,
}

impl Paragraph {
    /// Create a new paragraph.
    #[must_use]
    pub fn new(
        doc_id: DocId,
        paragraph_index: usize,
        text: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            doc_id,
            paragraph_index,
            text: text.into(),
            url: url.into(),
            signature: None,
            shard: None,
        }
    }
}

/// A document rebuilt from its surviving paragraphs (or passed through the
/// exact stage untouched).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedDocument {
    /// Identifier of the source document.
    pub id: DocId,
    /// Cleaned text.
    pub text: String,
    /// Source URL.
    pub url: String,
}

impl From<Document> for CleanedDocument {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            text: doc.text,
            url: doc.url,
        }
    }
}
