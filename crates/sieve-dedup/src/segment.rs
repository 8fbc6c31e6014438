//! Paragraph segmentation.
//!
//! A paragraph boundary is a run of two or more newlines. Pieces are
//! trimmed and empty ones dropped, so `paragraph_index` is dense.

use crate::document::{DocId, Document, Paragraph};
use rayon::prelude::*;

/// Paragraphs of a batch plus the documents that produced none.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// All paragraphs, grouped by document in input order.
    pub paragraphs: Vec<Paragraph>,
    /// Documents whose text held no non-empty paragraph.
    pub empty_documents: Vec<DocId>,
}

/// Trimmed, non-empty paragraphs of `text`, in order.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

/// Segment one document.
#[must_use]
pub fn segment_document(doc: &Document) -> Vec<Paragraph> {
    split_paragraphs(&doc.text)
        .enumerate()
        .map(|(index, text)| Paragraph::new(doc.id, index, text, doc.url.as_str()))
        .collect()
}

/// Segment a batch. Runs to completion before paragraphs are sharded,
/// since fuzzy routing keys on the global paragraph position.
#[must_use]
pub fn segment(docs: &[Document]) -> Segmentation {
    let per_doc: Vec<Vec<Paragraph>> = docs.par_iter().map(segment_document).collect();

    let mut out = Segmentation {
        paragraphs: Vec::with_capacity(per_doc.iter().map(Vec::len).sum()),
        empty_documents: Vec::new(),
    };
    for (doc, paragraphs) in docs.iter().zip(per_doc) {
        if paragraphs.is_empty() {
            out.empty_documents.push(doc.id);
        }
        out.paragraphs.extend(paragraphs);
    }

    out
}
