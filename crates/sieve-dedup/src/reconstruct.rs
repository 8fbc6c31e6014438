//! Rebuild documents from surviving paragraphs.
//!
//! Paragraph boundaries are not kept: paragraphs are joined with a single
//! space. Documents left with no paragraph simply do not appear.

use crate::document::{CleanedDocument, DocId, Paragraph};
use std::collections::{HashMap, HashSet};

/// Group paragraphs by document, order each group by `paragraph_index`, and
/// join. Documents are emitted in order of first appearance.
#[must_use]
pub fn reconstruct(paragraphs: Vec<Paragraph>) -> Vec<CleanedDocument> {
    let mut slot: HashMap<DocId, usize> = HashMap::new();
    let mut groups: Vec<(DocId, Vec<Paragraph>)> = Vec::new();

    for paragraph in paragraphs {
        let idx = *slot.entry(paragraph.doc_id).or_insert_with(|| {
            groups.push((paragraph.doc_id, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(paragraph);
    }

    groups
        .into_iter()
        .map(|(id, mut group)| {
            group.sort_by_key(|p| p.paragraph_index);
            // All paragraphs of a document carry the same url.
            let url = group[0].url.clone();
            let text = group
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            CleanedDocument { id, text, url }
        })
        .collect()
}

/// Ids in `expected` that have no document in `output`, in `expected` order.
#[must_use]
pub fn missing_documents(expected: &[DocId], output: &[CleanedDocument]) -> Vec<DocId> {
    let present: HashSet<DocId> = output.iter().map(|d| d.id).collect();
    expected
        .iter()
        .copied()
        .filter(|id| !present.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_middle_paragraph() {
        let paragraphs = vec![
            Paragraph::new(1, 0, "first", "http://a"),
            Paragraph::new(1, 2, "third", "http://a"),
        ];
        let docs = reconstruct(paragraphs);

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "first third");
        assert_eq!(docs[0].url, "http://a");
    }

    #[test]
    fn test_sorts_by_paragraph_index() {
        let paragraphs = vec![
            Paragraph::new(7, 2, "c", "u"),
            Paragraph::new(7, 0, "a", "u"),
            Paragraph::new(7, 1, "b", "u"),
        ];
        assert_eq!(reconstruct(paragraphs)[0].text, "a b c");
    }

    #[test]
    fn test_first_appearance_order() {
        let paragraphs = vec![
            Paragraph::new(9, 0, "nine", ""),
            Paragraph::new(3, 0, "three", ""),
            Paragraph::new(9, 1, "nine again", ""),
        ];
        let ids: Vec<_> = reconstruct(paragraphs).iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![9, 3]);
    }

    #[test]
    fn test_empty_input() {
        assert!(reconstruct(Vec::new()).is_empty());
    }

    #[test]
    fn test_missing_documents() {
        let out = reconstruct(vec![Paragraph::new(2, 0, "x", "")]);
        assert_eq!(missing_documents(&[1, 2, 3], &out), vec![1, 3]);
    }
}
